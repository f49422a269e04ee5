//! Inbound requests and their responses.
//!
//! A transport hands the core a request path (`/status`,
//! `/history?window=1h`, ...).  [`HubRequest::parse`] turns it into a typed
//! request; the [`service`](super::service) answers it with a [`Response`].

use crate::history::DisplayWindow;

/// Requests the outside world can make of the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubRequest {
    /// Latest snapshot.
    Status,
    /// Full pixel grid of the last frame.
    ThermalData,
    /// Re-run thermometer discovery.
    Rescan,
    StartLog,
    StopLog,
    DeleteLog,
    LogInfo,
    /// Raw log bytes.
    Download,
    /// Retained history inside a display window.
    History(DisplayWindow),
}

impl HubRequest {
    /// Parse a request path with an optional query string.
    ///
    /// Unknown paths return `None`.  `/history` without a (valid) `window`
    /// parameter means the whole buffer.
    pub fn parse(target: &str) -> Option<Self> {
        let target = target.trim();
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (target, None),
        };

        let req = match path {
            "/status" => Self::Status,
            "/thermaldata" => Self::ThermalData,
            "/rescan" => Self::Rescan,
            "/startlog" => Self::StartLog,
            "/stoplog" => Self::StopLog,
            "/deletelog" => Self::DeleteLog,
            "/loginfo" => Self::LogInfo,
            "/download" => Self::Download,
            "/history" => {
                let window = query
                    .and_then(|q| query_param(q, "window"))
                    .and_then(DisplayWindow::parse)
                    .unwrap_or(DisplayWindow::All);
                Self::History(window)
            }
            _ => return None,
        };
        Some(req)
    }
}

fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Answer to one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Json(serde_json::Value),
    Bytes {
        content_type: &'static str,
        body: Vec<u8>,
    },
    NotFound(&'static str),
}

impl Response {
    /// HTTP-style status code for transports that need one.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Json(_) | Self::Bytes { .. } => 200,
            Self::NotFound(_) => 404,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_paths_parse() {
        assert_eq!(HubRequest::parse("/status"), Some(HubRequest::Status));
        assert_eq!(HubRequest::parse("/rescan\n"), Some(HubRequest::Rescan));
        assert_eq!(HubRequest::parse("/download"), Some(HubRequest::Download));
        assert_eq!(HubRequest::parse("/nope"), None);
        assert_eq!(HubRequest::parse(""), None);
    }

    #[test]
    fn history_window_query() {
        assert_eq!(
            HubRequest::parse("/history?window=15m"),
            Some(HubRequest::History(DisplayWindow::FifteenMinutes))
        );
        assert_eq!(
            HubRequest::parse("/history?x=1&window=6h"),
            Some(HubRequest::History(DisplayWindow::SixHours))
        );
        assert_eq!(
            HubRequest::parse("/history?window=bogus"),
            Some(HubRequest::History(DisplayWindow::All))
        );
        assert_eq!(
            HubRequest::parse("/history"),
            Some(HubRequest::History(DisplayWindow::All))
        );
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(Response::NotFound("x").status_code(), 404);
        assert_eq!(Response::Json(serde_json::Value::Null).status_code(), 200);
    }
}
