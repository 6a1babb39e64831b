use tokio_util::sync::CancellationToken;

use crate::endpoint::{Device, Endpoint, OpenMode};
use crate::error::Result;

/// Read from `endpoint` until the writer closes and the ring is drained
pub async fn read_to_end(endpoint: &mut Endpoint, cancel: &CancellationToken) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut chunk = vec![0u8; endpoint.channel().capacity()];
    loop {
        let n = endpoint.read(&mut chunk, cancel).await?;
        if n == 0 {
            return Ok(data);
        }
        data.extend_from_slice(&chunk[..n]);
    }
}

/// Open for writing, write `bytes`, and close (fire-and-forget)
pub async fn send(device: &Device, bytes: &[u8], cancel: &CancellationToken) -> Result<()> {
    let mut endpoint = device.open(OpenMode::Write, cancel).await?;
    endpoint.write(bytes, cancel).await?;
    endpoint.close()?;
    Ok(())
}

/// Open for reading, collect everything until end of stream, and close
pub async fn receive(device: &Device, cancel: &CancellationToken) -> Result<Vec<u8>> {
    let mut endpoint = device.open(OpenMode::Read, cancel).await?;
    let data = read_to_end(&mut endpoint, cancel).await?;
    endpoint.close()?;
    Ok(data)
}
