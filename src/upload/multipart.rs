//! Hand-built `multipart/form-data` bodies.

/// Build a body carrying a single file field named `file`.
pub(super) fn build_file_multipart(
    boundary: &str,
    file_name: &str,
    mime_type: &str,
    contents: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(contents.len() + 256);

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            escape_quotes(file_name)
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(contents);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    body
}

fn escape_quotes(value: &str) -> String {
    value.replace('"', "%22")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_wraps_file_between_boundaries() {
        let body = build_file_multipart("b0", "notes.pdf", "application/pdf", b"%PDF-1.4");
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with("--b0\r\n"));
        assert!(text.contains("name=\"file\"; filename=\"notes.pdf\""));
        assert!(text.contains("Content-Type: application/pdf\r\n\r\n%PDF-1.4\r\n"));
        assert!(text.ends_with("--b0--\r\n"));
    }

    #[test]
    fn quotes_in_file_names_are_escaped() {
        let body = build_file_multipart("b0", "a\"b.pdf", "application/pdf", b"");
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("filename=\"a%22b.pdf\""));
    }
}
