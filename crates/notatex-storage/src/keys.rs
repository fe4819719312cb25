/// Storage key for an uploaded image, namespaced by the owning account.
/// Two uploads of the same filename by the same account share a key
/// (last write wins).
pub fn image_key(account_id: i64, filename: &str) -> String {
    format!("{}/{}", account_id, filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_key_is_account_scoped() {
        assert_eq!(image_key(7, "note.png"), "7/note.png");
        assert_ne!(image_key(7, "note.png"), image_key(8, "note.png"));
    }
}
