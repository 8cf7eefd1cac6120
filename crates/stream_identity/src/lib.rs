//! Signed identifiers for the server-push channel a page subscribes to.
//!
//! The operation engine never looks inside these: a page carries a
//! `<stream-from identifier="…">` tag, the transport verifies the identifier
//! and starts delivering batches for the named stream.

mod compound;
mod signer;

pub use compound::compound;
pub use signer::{IdentityError, SignedStreamIdentifier, StreamSigner};

/// The subscription tag for the stream named by `keys`.
pub fn stream_from<K: AsRef<str>>(
    signer: &StreamSigner,
    keys: &[Option<K>],
) -> Result<String, IdentityError> {
    let identifier = signer.sign(&compound(keys))?;
    let mut out = String::from(r#"<stream-from identifier=""#);
    escape_attribute(identifier.as_str(), &mut out);
    out.push_str(r#""></stream-from>"#);
    Ok(out)
}

fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}
