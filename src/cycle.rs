//! One fetch → convert → display iteration, and the loop that repeats it.

use crate::client::{ClientError, DisplayService};
use crate::lifecycle::{PanelError, PanelHandle};
use image::ImageError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};
use trmnl_convert::{convert, open_image, PanelGeometry, RenderOptions};
use trmnl_epd::Panel;

/// Wait after any failed cycle. Fixed, no backoff.
pub const FAILURE_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("error fetching display: {0}")]
    Client(#[from] ClientError),
    #[error("display response has no image_url")]
    MissingImageUrl,
    #[error("error decoding image: {0}")]
    Decode(#[from] ImageError),
    #[error("error writing to display: {0}")]
    Panel(#[from] PanelError),
    #[error("recovered from crash: {0}")]
    Panicked(String),
}

#[derive(Debug)]
pub enum CycleOutcome {
    Displayed(Duration),
    Failed(CycleError),
}

impl CycleOutcome {
    pub fn next_delay(&self) -> Duration {
        match self {
            CycleOutcome::Displayed(interval) => *interval,
            CycleOutcome::Failed(_) => FAILURE_COOLDOWN,
        }
    }
}

pub struct RefreshController<S, P> {
    service: S,
    panel: PanelHandle<P>,
    workdir: PathBuf,
    geometry: PanelGeometry,
    options: RenderOptions,
}

impl<S: DisplayService, P: Panel> RefreshController<S, P> {
    pub fn new(service: S, panel: PanelHandle<P>, workdir: impl Into<PathBuf>, options: RenderOptions) -> Self {
        let geometry = panel.geometry();
        Self {
            service,
            panel,
            workdir: workdir.into(),
            geometry,
            options,
        }
    }

    /// Run one cycle. Errors and panics both come back as `Failed`.
    pub fn run_cycle(&self) -> CycleOutcome {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.try_cycle()))
            .unwrap_or_else(|payload| Err(CycleError::Panicked(panic_message(payload.as_ref()))));
        match result {
            Ok(interval) => CycleOutcome::Displayed(interval),
            Err(err) => {
                error!("{err}");
                CycleOutcome::Failed(err)
            }
        }
    }

    fn try_cycle(&self) -> Result<Duration, CycleError> {
        let instruction = self.service.fetch_display()?;
        if instruction.image_url.is_empty() {
            return Err(CycleError::MissingImageUrl);
        }

        let image_path = self.workdir.join(instruction.target_filename());
        self.service.download_image(&instruction.image_url, &image_path)?;

        debug!("Reading image from {}", image_path.display());
        let img = open_image(&image_path)?;
        let frame = convert(&img, self.geometry, self.options);
        self.panel.write_frame(&frame)?;
        debug!("Image displayed successfully");

        Ok(instruction.refresh_interval())
    }

    /// Cycle until the process is terminated.
    pub fn run_forever(&self) -> ! {
        loop {
            let delay = self.run_cycle().next_delay();
            debug!("Next refresh in {:?}", delay);
            thread::sleep(delay);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DisplayResponse;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::cell::RefCell;
    use std::fmt;
    use std::fs;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use trmnl_convert::PackedFrame;

    #[derive(Debug)]
    struct WriteFailed;

    impl fmt::Display for WriteFailed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "write failed")
        }
    }

    impl std::error::Error for WriteFailed {}

    #[derive(Clone, Default)]
    struct RecordingPanel {
        frames: Arc<Mutex<Vec<Vec<u8>>>>,
        fail_writes: bool,
    }

    impl Panel for RecordingPanel {
        type Error = WriteFailed;

        fn geometry(&self) -> PanelGeometry {
            PanelGeometry::new(16, 8).unwrap()
        }

        fn clear(&mut self, _fill: u8) -> Result<(), WriteFailed> {
            Ok(())
        }

        fn write_frame(&mut self, frame: &PackedFrame) -> Result<(), WriteFailed> {
            if self.fail_writes {
                return Err(WriteFailed);
            }
            self.frames.lock().unwrap().push(frame.as_bytes().to_vec());
            Ok(())
        }

        fn sleep(&mut self) -> Result<(), WriteFailed> {
            Ok(())
        }
    }

    enum Reply {
        Display(DisplayResponse),
        Status(u16),
        Panic,
    }

    struct FakeService {
        reply: Reply,
        image: Vec<u8>,
        downloads: RefCell<Vec<PathBuf>>,
    }

    impl FakeService {
        fn new(reply: Reply, image: Vec<u8>) -> Self {
            Self {
                reply,
                image,
                downloads: RefCell::new(Vec::new()),
            }
        }
    }

    impl DisplayService for FakeService {
        fn fetch_display(&self) -> Result<DisplayResponse, ClientError> {
            match &self.reply {
                Reply::Display(display) => Ok(display.clone()),
                Reply::Status(code) => Err(ClientError::Status(*code)),
                Reply::Panic => panic!("service blew up"),
            }
        }

        fn download_image(&self, _url: &str, dest: &Path) -> Result<u64, ClientError> {
            fs::write(dest, &self.image)?;
            self.downloads.borrow_mut().push(dest.to_path_buf());
            Ok(self.image.len() as u64)
        }
    }

    fn black_png() -> Vec<u8> {
        let img = RgbImage::from_pixel(32, 16, Rgb([0, 0, 0]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn scenario_one() -> DisplayResponse {
        serde_json::from_str(r#"{"image_url":"http://x/1.png","filename":"","refresh_rate":30}"#).unwrap()
    }

    fn controller(
        service: FakeService,
        panel: RecordingPanel,
        tmp: &TempDir,
    ) -> RefreshController<FakeService, RecordingPanel> {
        RefreshController::new(service, PanelHandle::new(panel), tmp.path(), RenderOptions::default())
    }

    #[test]
    fn displays_and_sleeps_for_instructed_interval() {
        let tmp = TempDir::new().unwrap();
        let panel = RecordingPanel::default();
        let frames = panel.frames.clone();
        let ctl = controller(FakeService::new(Reply::Display(scenario_one()), black_png()), panel, &tmp);

        let outcome = ctl.run_cycle();
        assert!(matches!(outcome, CycleOutcome::Displayed(_)));
        assert_eq!(outcome.next_delay(), Duration::from_secs(30));
        assert_eq!(ctl.service.downloads.borrow()[0], tmp.path().join("display.jpg"));

        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0], vec![0xFF; 16]);
    }

    #[test]
    fn server_error_skips_panel_and_cools_down() {
        let tmp = TempDir::new().unwrap();
        let panel = RecordingPanel::default();
        let frames = panel.frames.clone();
        let ctl = controller(FakeService::new(Reply::Status(500), black_png()), panel, &tmp);

        let outcome = ctl.run_cycle();
        assert!(matches!(
            outcome,
            CycleOutcome::Failed(CycleError::Client(ClientError::Status(500)))
        ));
        assert_eq!(outcome.next_delay(), FAILURE_COOLDOWN);
        assert!(frames.lock().unwrap().is_empty());
        assert!(ctl.service.downloads.borrow().is_empty());
    }

    #[test]
    fn undecodable_image_fails_cycle() {
        let tmp = TempDir::new().unwrap();
        let panel = RecordingPanel::default();
        let frames = panel.frames.clone();
        let ctl = controller(
            FakeService::new(Reply::Display(scenario_one()), b"<html>oops</html>".to_vec()),
            panel,
            &tmp,
        );

        let outcome = ctl.run_cycle();
        assert!(matches!(outcome, CycleOutcome::Failed(CycleError::Decode(_))));
        assert_eq!(outcome.next_delay(), Duration::from_secs(60));
        assert!(frames.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_image_url_fails_without_download() {
        let tmp = TempDir::new().unwrap();
        let ctl = controller(
            FakeService::new(Reply::Display(DisplayResponse::default()), black_png()),
            RecordingPanel::default(),
            &tmp,
        );
        assert!(matches!(
            ctl.run_cycle(),
            CycleOutcome::Failed(CycleError::MissingImageUrl)
        ));
        assert!(ctl.service.downloads.borrow().is_empty());
    }

    #[test]
    fn panel_write_failure_fails_cycle() {
        let tmp = TempDir::new().unwrap();
        let panel = RecordingPanel {
            fail_writes: true,
            ..Default::default()
        };
        let ctl = controller(FakeService::new(Reply::Display(scenario_one()), black_png()), panel, &tmp);
        let outcome = ctl.run_cycle();
        assert!(matches!(
            outcome,
            CycleOutcome::Failed(CycleError::Panel(PanelError::Device(_)))
        ));
        assert_eq!(outcome.next_delay(), FAILURE_COOLDOWN);
    }

    #[test]
    fn panic_is_recovered_at_cycle_boundary() {
        let tmp = TempDir::new().unwrap();
        let ctl = controller(FakeService::new(Reply::Panic, black_png()), RecordingPanel::default(), &tmp);
        match ctl.run_cycle() {
            CycleOutcome::Failed(CycleError::Panicked(msg)) => assert_eq!(msg, "service blew up"),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn asleep_panel_rejects_frames() {
        let tmp = TempDir::new().unwrap();
        let ctl = controller(
            FakeService::new(Reply::Display(scenario_one()), black_png()),
            RecordingPanel::default(),
            &tmp,
        );
        ctl.panel.sleep();
        assert!(matches!(
            ctl.run_cycle(),
            CycleOutcome::Failed(CycleError::Panel(PanelError::Asleep))
        ));
    }

    #[test]
    fn download_overwrites_previous_image() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("display.jpg"), b"stale").unwrap();
        let ctl = controller(
            FakeService::new(Reply::Display(scenario_one()), black_png()),
            RecordingPanel::default(),
            &tmp,
        );
        assert!(matches!(ctl.run_cycle(), CycleOutcome::Displayed(_)));
        assert_eq!(fs::read(tmp.path().join("display.jpg")).unwrap(), black_png());
    }
}
