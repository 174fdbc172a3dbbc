/// Credential verification lives behind this single function so the storage
/// scheme can move to salted hashes without touching any handler.
///
/// Passwords are currently stored and compared verbatim.
pub fn verify_password(stored: &str, supplied: &str) -> bool {
    stored == supplied
}
