use axum::http::HeaderMap;

/// Form fields in the order the browser sent them. Keys may repeat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// First value sent for `key`, like `FormData.get` in the browser.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> Vec<&str> {
        self.pairs.iter().map(|(k, _)| k.as_str()).collect()
    }
}

/// Parse a request body based on Content-Type header.
pub async fn parse(headers: &HeaderMap, body: bytes::Bytes) -> Result<FormData, String> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.contains("multipart/form-data") {
        parse_multipart(content_type, body).await
    } else if content_type.contains("application/x-www-form-urlencoded") || content_type.is_empty()
    {
        parse_form_urlencoded(&body)
    } else {
        Err(format!("Unsupported content type: {content_type}"))
    }
}

fn parse_form_urlencoded(body: &[u8]) -> Result<FormData, String> {
    let body_str = std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;
    let pairs = form_urlencoded::parse(body_str.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    Ok(FormData::new(pairs))
}

/// Parse multipart form data using multer.
async fn parse_multipart(content_type: &str, body: bytes::Bytes) -> Result<FormData, String> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|_| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut pairs = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let name = field.name().unwrap_or("unknown").to_string();
        let value = field
            .text()
            .await
            .map_err(|e| format!("Field read error: {e}"))?;
        pairs.push((name, value));
    }

    Ok(FormData::new(pairs))
}
