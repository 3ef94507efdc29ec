use tracing::debug;

use snaplens_core::CaptureRegion;

/// Rendering seam for the selection overlay.
///
/// The real visuals (full-viewport dim, crosshair cursor, tracking
/// rectangle) belong to the host's rendering layer; the selector only drives
/// this interface. In stealth mode the overlay still mounts (pointer events
/// must keep flowing to the selector) but stays fully transparent, and
/// `update_rect` is never called.
pub trait OverlayRenderer: Send {
    /// Install the overlay and suspend normal pointer interaction with the
    /// page. `stealth` renders it with no visible cue.
    fn mount(&mut self, stealth: bool);

    /// Redraw the live tracking rectangle.
    fn update_rect(&mut self, region: CaptureRegion);

    /// Remove every overlay element and restore normal pointer interaction.
    /// Must be safe to call more than once.
    fn teardown(&mut self);
}

/// Overlay that only logs; used when no rendering layer is attached (daemon
/// runs, demos).
#[derive(Default)]
pub struct LogOverlay {
    mounted: bool,
}

impl LogOverlay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OverlayRenderer for LogOverlay {
    fn mount(&mut self, stealth: bool) {
        self.mounted = true;
        debug!(stealth, "Selection overlay mounted");
    }

    fn update_rect(&mut self, region: CaptureRegion) {
        debug!(
            x = region.origin_x,
            y = region.origin_y,
            w = region.width,
            h = region.height,
            "Tracking rectangle updated"
        );
    }

    fn teardown(&mut self) {
        if self.mounted {
            self.mounted = false;
            debug!("Selection overlay torn down");
        }
    }
}
