//! Drive a renderer from a tokio task.
//!
//! Renderers hold `Rc`s and component closures, so these futures are not
//! `Send`: run them on a current-thread runtime or inside a `LocalSet`.

use core::future::Future;

use anyhow::Error;
use log::debug;
use tokio::task;

use crate::config::RendererConfig;
use crate::host::HostAdapter;
use crate::scheduler::{FrameDeadline, LoopStatus, Renderer};

/// Run frame-sized slices until the renderer is idle, yielding to the
/// runtime between slices. Returns the number of commits.
///
/// # Errors
/// Returns the first error from [`Renderer::work_loop`].
pub async fn run_until_idle<H: HostAdapter>(
    renderer: &mut Renderer<H>,
    config: &RendererConfig,
) -> Result<usize, Error> {
    let mut commits = 0;
    loop {
        let deadline = FrameDeadline::from_config(config);
        match renderer.work_loop(&deadline)? {
            LoopStatus::Yielded => {}
            LoopStatus::Committed => commits += 1,
            LoopStatus::Idle => return Ok(commits),
        }
        task::yield_now().await;
    }
}

/// Keep rendering until `shutdown` resolves, parking while idle until a state
/// setter requests a new pass. Returns the number of commits.
///
/// # Errors
/// Returns the first error from [`Renderer::work_loop`].
pub async fn run<H, F>(renderer: &mut Renderer<H>, config: &RendererConfig, shutdown: F) -> Result<usize, Error>
where
    H: HostAdapter,
    F: Future<Output = ()>,
{
    let signal = renderer.signal();
    tokio::pin!(shutdown);
    let mut commits = 0;
    loop {
        commits += run_until_idle(renderer, config).await?;
        tokio::select! {
            biased;
            () = &mut shutdown => {
                debug!("Render driver shutting down after {commits} commits");
                return Ok(commits);
            }
            () = signal.requested() => {}
        }
    }
}
