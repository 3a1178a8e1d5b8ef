use reqwest::Url;

use crate::error::{Error, Result};

pub const WS_PATH: &str = "/ws";

/// Maps a dashboard origin such as `https://soc.example.com` to the socket
/// endpoint on `port`: `http` becomes `ws`, `https` becomes `wss`.
pub fn endpoint_for_origin(origin: &str, port: u16) -> Result<String> {
    let url = Url::parse(origin).map_err(|e| Error::Endpoint(format!("{origin}: {e}")))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(Error::Endpoint(format!("unsupported scheme {other:?}"))),
    };
    let host = url
        .host_str()
        .ok_or_else(|| Error::Endpoint(format!("{origin}: missing host")))?;

    Ok(format!("{scheme}://{host}:{port}{WS_PATH}"))
}
