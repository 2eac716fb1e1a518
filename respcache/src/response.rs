use anyhow::Context;
use http::StatusCode;
use respcache_entry::Headers;

/// A raw HTTP/1.x response read from disk.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: Headers,
    pub body: Vec<u8>,
}

/// Parse a complete HTTP/1.x response, keeping header names as sent.
///
/// Hop-by-hop headers are dropped, a chunked body is decoded, and
/// `Content-Length` is rewritten to the stored body length.
pub fn parse_http1_response(bytes: &[u8]) -> anyhow::Result<RawResponse> {
    let mut headers = [httparse::EMPTY_HEADER; 64];
    let mut resp = httparse::Response::new(&mut headers);
    let parsed = resp.parse(bytes).context("parse http/1 response")?;
    let header_len = match parsed {
        httparse::Status::Complete(len) => len,
        httparse::Status::Partial => anyhow::bail!("incomplete http/1 response"),
    };

    let code = resp.code.context("response has no status code")?;
    let status = StatusCode::from_u16(code).context("invalid status code")?;

    let mut out = Headers::new();
    let mut is_chunked = false;
    let mut content_length: Option<usize> = None;

    for header in resp.headers.iter() {
        let name = header.name;
        let Ok(value) = std::str::from_utf8(header.value) else {
            continue;
        };
        match name.to_ascii_lowercase().as_str() {
            "connection" | "proxy-connection" | "keep-alive" | "upgrade" => continue,
            "transfer-encoding" => {
                if value
                    .to_ascii_lowercase()
                    .split(',')
                    .any(|v| v.trim().trim_matches('"') == "chunked")
                {
                    is_chunked = true;
                }
                continue;
            }
            "content-length" => {
                if let Ok(len) = value.trim().parse::<usize>() {
                    content_length = Some(len);
                }
            }
            _ => {}
        }
        out.append(name, value.trim());
    }

    let mut body = bytes[header_len..].to_vec();
    if is_chunked {
        body = decode_chunked(&body)?;
    } else if let Some(len) = content_length
        && body.len() > len
    {
        body.truncate(len);
    }

    if out.contains("Content-Length") || is_chunked {
        out.insert("Content-Length", body.len().to_string());
    }

    Ok(RawResponse {
        status,
        headers: out,
        body,
    })
}

fn decode_chunked(body: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut input = body;

    loop {
        let Some(line_end) = find_crlf(input) else {
            anyhow::bail!("invalid chunked encoding: missing size line");
        };
        let line = &input[..line_end];
        input = &input[line_end + 2..];

        let line_str = std::str::from_utf8(line)?;
        let size_str = line_str.split(';').next().unwrap_or("").trim();
        let size =
            usize::from_str_radix(size_str, 16).context("invalid chunk size in chunked body")?;

        if size == 0 {
            // Trailers are not merged into the stored headers.
            break;
        }

        if size.checked_add(2).is_none_or(|need| input.len() < need) {
            anyhow::bail!("invalid chunked encoding: chunk too short");
        }

        out.extend_from_slice(&input[..size]);
        input = &input[size..];

        if !input.starts_with(b"\r\n") {
            anyhow::bail!("invalid chunked encoding: missing CRLF after chunk");
        }
        input = &input[2..];
    }

    Ok(out)
}

fn find_crlf(input: &[u8]) -> Option<usize> {
    input.windows(2).position(|w| w == b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::parse_http1_response;
    use http::StatusCode;

    #[test]
    fn keeps_header_casing_and_body() {
        let raw = b"HTTP/1.1 200 OK\r\nCache-Control: max-age=60\r\nx-Trace-ID: abc\r\nContent-Length: 5\r\nConnection: keep-alive\r\n\r\nhelloEXTRA";
        let resp = parse_http1_response(raw).expect("valid response");
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body, b"hello");
        let names: Vec<&str> = resp.headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Cache-Control", "x-Trace-ID", "Content-Length"]);
    }

    #[test]
    fn decodes_chunked_body() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nETag: \"v1\"\r\n\r\n3\r\nabc\r\n2\r\nde\r\n0\r\n\r\n";
        let resp = parse_http1_response(raw).expect("valid response");
        assert_eq!(resp.body, b"abcde");
        assert_eq!(resp.headers.get("content-length"), Some("5"));
        assert!(!resp.headers.contains("transfer-encoding"));
    }

    #[test]
    fn not_modified_without_body() {
        let raw = b"HTTP/1.1 304 Not Modified\r\nETag: \"v2\"\r\nCache-Control: max-age=120\r\n\r\n";
        let resp = parse_http1_response(raw).expect("valid response");
        assert_eq!(resp.status, StatusCode::NOT_MODIFIED);
        assert!(resp.body.is_empty());
        assert!(!resp.headers.contains("Content-Length"));
    }

    #[test]
    fn decodes_oversized_chunk_size_as_error() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nffffffffffffffff\r\nab\r\n0\r\n\r\n";
        let err = parse_http1_response(raw).expect_err("chunk larger than the body");
        assert!(err.to_string().contains("chunk too short"));
    }

    #[test]
    fn chunk_longer_than_remaining_body_fails() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n10\r\nabc\r\n0\r\n\r\n";
        assert!(parse_http1_response(raw).is_err());
    }

    #[test]
    fn incomplete_head_fails() {
        assert!(parse_http1_response(b"HTTP/1.1 200 OK\r\nETag: \"v1\"\r\n").is_err());
    }
}
