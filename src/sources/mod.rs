/// Sources module
///
/// Everything needed to obtain an access token: the signed JWT assertion,
/// the OAuth2 exchange and the refresh loop that drives them.
pub mod assertion;
pub mod executor;
pub mod oauth2;
