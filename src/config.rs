/// Validated run configuration
///
/// The CLI hands raw flag values to these constructors. Every check here runs
/// before any file is opened or any packet is sent.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::dataset::{load_rows, DatasetRow, RowRange};
use crate::display::ScreenGeometry;
use crate::sync::UdpTransport;
use crate::{Error, Result};

/// What to show during a capture session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub csv_path: PathBuf,
    pub data_dir: PathBuf,
    pub range: RowRange,
    pub geometry: ScreenGeometry,
}

impl SessionConfig {
    pub fn new(
        csv_path: PathBuf,
        data_dir: PathBuf,
        row_start: usize,
        row_end: Option<usize>,
        screen_width: u32,
        screen_height: u32,
    ) -> Result<Self> {
        let range = RowRange::new(row_start, row_end)?;
        let geometry = ScreenGeometry::new(screen_width, screen_height)?;
        Ok(Self {
            csv_path,
            data_dir,
            range,
            geometry,
        })
    }

    /// Load and resolve the rows of this session
    pub fn load_rows(&self) -> Result<Vec<DatasetRow>> {
        load_rows(&self.csv_path, &self.data_dir, self.range)
    }
}

/// Where the capture device listens and how long to wait for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    pub address: SocketAddr,
    pub timeout: Duration,
}

impl DeviceConfig {
    pub fn new(ip: IpAddr, port: u16, timeout: Duration) -> Result<Self> {
        if port == 0 {
            return Err(Error::InvalidConfig("device port must be non-zero".to_string()));
        }
        if timeout.is_zero() {
            return Err(Error::InvalidConfig("request timeout must be positive".to_string()));
        }
        Ok(Self {
            address: SocketAddr::new(ip, port),
            timeout,
        })
    }

    pub fn transport(&self) -> Result<UdpTransport> {
        UdpTransport::new(self.address, self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_session_range_checked_before_io() {
        // The manifest does not exist; the range error must win
        let err = SessionConfig::new(
            PathBuf::from("/definitely/missing.csv"),
            PathBuf::from("/definitely/missing"),
            5,
            Some(5),
            1920,
            1080,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidRange { start: 5, end: 5 }));
    }

    #[test]
    fn test_session_geometry_checked() {
        let err = SessionConfig::new(PathBuf::from("a.csv"), PathBuf::from("d"), 0, None, 0, 1080)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry { .. }));
    }

    #[test]
    fn test_device_config() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 2, 127));
        let cfg = DeviceConfig::new(ip, 4445, Duration::from_secs(10)).unwrap();
        assert_eq!(cfg.address.to_string(), "10.0.2.127:4445");
        assert_eq!(cfg.transport().unwrap().device(), cfg.address);

        assert!(DeviceConfig::new(ip, 0, Duration::from_secs(10)).is_err());
        assert!(DeviceConfig::new(ip, 4445, Duration::ZERO).is_err());
    }
}
