/// Joins the present, non-empty keys with `:`.
pub fn compound<K: AsRef<str>>(keys: &[Option<K>]) -> String {
    keys.iter()
        .flatten()
        .map(AsRef::as_ref)
        .filter(|k| !k.is_empty())
        .collect::<Vec<_>>()
        .join(":")
}
