/// Console-driven display
///
/// Verifies each image decodes and logs what should be on screen. Operator
/// input arrives as lines on stdin: `q`, `esc` or end of input cancels the
/// session, anything else advances.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;

use super::{display_error, ImageDisplay, OperatorSignal, Pacing, ScreenGeometry};
use crate::dataset::DatasetRow;
use crate::Result;

pub struct ConsoleDisplay {
    input: Receiver<String>,
    input_closed: bool,
}

impl ConsoleDisplay {
    /// Read operator input from stdin on a background thread
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self::from_receiver(rx)
    }

    /// Take operator input from an existing channel
    pub fn from_receiver(input: Receiver<String>) -> Self {
        Self {
            input,
            input_closed: false,
        }
    }
}

fn classify(line: &str) -> OperatorSignal {
    match line.trim().to_ascii_lowercase().as_str() {
        "q" | "quit" | "esc" | "\u{1b}" => OperatorSignal::Cancel,
        _ => OperatorSignal::Advance,
    }
}

impl ImageDisplay for ConsoleDisplay {
    fn show(&mut self, row: &DatasetRow, geometry: ScreenGeometry) -> Result<()> {
        let (width, height) = image::image_dimensions(&row.resolved_path)
            .map_err(|e| display_error(&row.resolved_path, e))?;

        tracing::info!(
            sequence = row.sequence,
            image = %row.resolved_path.display(),
            width,
            height,
            screen_width = geometry.width,
            screen_height = geometry.height,
            "showing image"
        );
        Ok(())
    }

    fn wait(&mut self, pacing: Pacing) -> OperatorSignal {
        match pacing {
            Pacing::KeyPress => {
                if self.input_closed {
                    return OperatorSignal::Cancel;
                }
                match self.input.recv() {
                    Ok(line) => classify(&line),
                    Err(_) => {
                        self.input_closed = true;
                        OperatorSignal::Cancel
                    }
                }
            }
            Pacing::Delay(delay) => {
                if self.input_closed {
                    thread::sleep(delay);
                    return OperatorSignal::Advance;
                }
                match self.input.recv_timeout(delay) {
                    Ok(line) => classify(&line),
                    Err(RecvTimeoutError::Timeout) => OperatorSignal::Advance,
                    Err(RecvTimeoutError::Disconnected) => {
                        // Non-interactive runs keep their pacing
                        self.input_closed = true;
                        thread::sleep(delay);
                        OperatorSignal::Advance
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_cancel_words() {
        assert_eq!(classify("q"), OperatorSignal::Cancel);
        assert_eq!(classify(" ESC "), OperatorSignal::Cancel);
        assert_eq!(classify(""), OperatorSignal::Advance);
        assert_eq!(classify("next"), OperatorSignal::Advance);
    }

    #[test]
    fn test_key_press_follows_input() {
        let (tx, rx) = mpsc::channel();
        let mut display = ConsoleDisplay::from_receiver(rx);
        tx.send(String::new()).unwrap();
        tx.send("q".to_string()).unwrap();

        assert_eq!(display.wait(Pacing::KeyPress), OperatorSignal::Advance);
        assert_eq!(display.wait(Pacing::KeyPress), OperatorSignal::Cancel);
        drop(tx);
        assert_eq!(display.wait(Pacing::KeyPress), OperatorSignal::Cancel);
    }

    #[test]
    fn test_delay_advances_without_input() {
        let (_tx, rx) = mpsc::channel::<String>();
        let mut display = ConsoleDisplay::from_receiver(rx);
        let signal = display.wait(Pacing::Delay(Duration::from_millis(5)));
        assert_eq!(signal, OperatorSignal::Advance);
    }

    #[test]
    fn test_delay_honours_cancel() {
        let (tx, rx) = mpsc::channel();
        let mut display = ConsoleDisplay::from_receiver(rx);
        tx.send("esc".to_string()).unwrap();
        let signal = display.wait(Pacing::Delay(Duration::from_secs(5)));
        assert_eq!(signal, OperatorSignal::Cancel);
    }

    #[test]
    fn test_show_rejects_undecodable_image() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        let (_tx, rx) = mpsc::channel::<String>();
        let mut display = ConsoleDisplay::from_receiver(rx);
        let row = DatasetRow {
            sequence: 0,
            original_path: PathBuf::from("broken.png"),
            resolved_path: path,
        };
        let geometry = ScreenGeometry::new(1920, 1080).unwrap();
        assert!(display.show(&row, geometry).is_err());
    }

    #[test]
    fn test_show_accepts_real_image() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ok.png");
        image::RgbImage::new(4, 3).save(&path).unwrap();

        let (_tx, rx) = mpsc::channel::<String>();
        let mut display = ConsoleDisplay::from_receiver(rx);
        let row = DatasetRow {
            sequence: 2,
            original_path: PathBuf::from("ok.png"),
            resolved_path: path,
        };
        let geometry = ScreenGeometry::new(1920, 1080).unwrap();
        assert!(display.show(&row, geometry).is_ok());
    }
}
