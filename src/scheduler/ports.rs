// ABOUTME: Port resolution for container-image workloads.
// ABOUTME: Explicit ports win; otherwise the image's TCP ports, otherwise the platform default.

use thiserror::Error;

use super::metadata::ExecutionMetadata;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("No tcp ports found in image metadata")]
    NoTcpPorts,
}

/// Ports a container-image workload listens on, primary port first.
pub fn resolve_ports(
    explicit: &[u16],
    metadata: &ExecutionMetadata,
    default_port: u16,
) -> Result<Vec<u16>, PortError> {
    if !explicit.is_empty() {
        return Ok(explicit.to_vec());
    }

    let declared = match metadata.ports.as_deref() {
        None | Some([]) => return Ok(vec![default_port]),
        Some(declared) => declared,
    };

    let tcp: Vec<u16> = declared
        .iter()
        .filter(|spec| spec.is_tcp())
        .map(|spec| spec.port)
        .collect();

    // A non-TCP-only image would be unreachable through the router.
    if tcp.is_empty() {
        return Err(PortError::NoTcpPorts);
    }
    Ok(tcp)
}
