use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::concurrency::{ConcurrencySubsystem, Task};
use crate::foundation::error::{ClockworkError, ClockworkResult};
use crate::render::framebuffer::{Framebuffer, Resolution};
use crate::render::renderer::renderer;
use crate::scene::viewer::Scene;

/// Construction options for a [`RenderSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderSessionOpts {
    /// Run render tasks on a worker pool; otherwise a single worker runs them in turn.
    pub multi_threaded: bool,
    /// Worker count for multi-threaded execution. `None` defers to `CLOCKWORK_THREADS`, then to
    /// the available hardware parallelism.
    pub threads: Option<usize>,
    pub resolution: Resolution,
}

impl Default for RenderSessionOpts {
    fn default() -> Self {
        Self {
            multi_threaded: true,
            threads: None,
            resolution: Resolution::default(),
        }
    }
}

/// Per-frame counters returned by [`RenderSession::render_frame`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    pub tasks: usize,
    pub faces: usize,
    pub fragments: u64,
    pub elapsed: Duration,
}

/// A framebuffer plus the scheduler that fills it, driven one frame at a time.
#[derive(Debug)]
pub struct RenderSession {
    framebuffer: Arc<Framebuffer>,
    scheduler: ConcurrencySubsystem,
}

impl RenderSession {
    pub fn new(opts: RenderSessionOpts) -> ClockworkResult<Self> {
        Ok(Self {
            framebuffer: Arc::new(Framebuffer::new(opts.resolution)),
            scheduler: ConcurrencySubsystem::new(opts.multi_threaded, opts.threads)?,
        })
    }

    pub fn framebuffer(&self) -> &Arc<Framebuffer> {
        &self.framebuffer
    }

    /// Exclusive access for configuration (clear values, depth function, callbacks).
    ///
    /// Fails while another owner still holds the framebuffer.
    pub fn framebuffer_mut(&mut self) -> ClockworkResult<&mut Framebuffer> {
        Arc::get_mut(&mut self.framebuffer)
            .ok_or_else(|| ClockworkError::validation("framebuffer is shared and cannot be modified"))
    }

    pub fn scheduler(&self) -> &ConcurrencySubsystem {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut ConcurrencySubsystem {
        &mut self.scheduler
    }

    pub fn set_resolution(&mut self, resolution: Resolution, force: bool) -> ClockworkResult<()> {
        self.framebuffer_mut()?.resize(resolution, force);
        Ok(())
    }

    /// Draw `scene` into the framebuffer.
    ///
    /// Clears every plane, submits one task per body, waits for all of them, applies the viewer's
    /// image filter and finally signals that the frame is ready.
    #[tracing::instrument(skip_all, fields(bodies = scene.bodies.len(), renderer = %scene.viewer.renderer))]
    pub fn render_frame(&self, scene: &Scene) -> FrameStats {
        let start = Instant::now();
        self.framebuffer.clear();

        let renderer = renderer(scene.viewer.renderer);
        let fragments = Arc::new(AtomicU64::new(0));
        let mut tasks = 0;
        let mut faces = 0;
        for body in &scene.bodies {
            let task = renderer
                .create_render_task(body, &scene.viewer, &self.framebuffer)
                .map(|task| {
                    tasks += 1;
                    faces += task.face_count();
                    Box::new(task.with_fragment_counter(Arc::clone(&fragments))) as Box<dyn Task>
                });
            self.scheduler.submit_task(task);
        }
        self.scheduler.wait();

        self.framebuffer.apply_filter(scene.viewer.image_filter);
        let ready = self.framebuffer.signal_frame_ready();

        let stats = FrameStats {
            frame: ready.frame,
            tasks,
            faces,
            fragments: fragments.load(Ordering::Acquire),
            elapsed: start.elapsed(),
        };
        tracing::info!(
            frame = stats.frame,
            tasks,
            faces,
            fragments = stats.fragments,
            elapsed_ms = stats.elapsed.as_secs_f64() * 1000.0,
            "frame rendered"
        );
        stats
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/session.rs"]
mod tests;
