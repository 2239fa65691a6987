// Transient DTOs mirroring the issuing API's resources

pub mod card;
pub mod cardholder;
