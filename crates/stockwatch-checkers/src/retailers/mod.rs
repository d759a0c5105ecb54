//! One submodule per storefront integration.

pub mod amazon;
pub mod apple;
pub mod croma;
pub mod flipkart;
pub mod oppo;
pub mod reliance_digital;
pub mod vivo;

pub use amazon::{AmazonChecker, AmazonCredentials};
pub use apple::AppleChecker;
pub use croma::CromaChecker;
pub use flipkart::FlipkartChecker;
pub use oppo::{OppoChecker, OppoVariant};
pub use reliance_digital::RelianceDigitalChecker;
pub use vivo::VivoShopChecker;
