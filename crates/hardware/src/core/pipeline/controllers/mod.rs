//! Pipeline controllers.
//!
//! A controller wraps one stage (or stage chain) with a registering discipline and drives
//! the valid/ready protocol on its two links. It provides:
//! 1. **UnbufferedPipeline:** One input register, output computed combinationally from it.
//! 2. **UnbufferedPipeline2:** Combinational while empty, with a skid buffer that parks a
//!    refused output.
//! 3. **SimpleHandshake:** One output register, ready passed straight through.
//! 4. **PassThroughHandshake:** One output register, accepts whenever it is being emptied.
//! 5. **FifoControl:** A queue of configurable depth, optionally first-word-fall-through;
//!    `BufferedHandshake` and `RegisterPipeline` are its two standard configurations.
//! 6. **MaskCancellable:** One output register whose contents can be cancelled in flight.
//!
//! Every controller is a [`Pipe`](super::traits::Pipe) and therefore composable with
//! [`connect`](super::connect). [`wrap`] picks one from a [`ControllerKind`] at run time.

/// Implements the port accessors of [`Pipe`](super::traits::Pipe) for a controller that
/// stores its stage in `stage` and its ports in `p` and `n`.
macro_rules! stage_ports {
    () => {
        fn p(&self) -> &$crate::core::pipeline::signals::PrevControl<Self::Input> {
            &self.p
        }

        fn p_mut(&mut self) -> &mut $crate::core::pipeline::signals::PrevControl<Self::Input> {
            &mut self.p
        }

        fn n(&self) -> &$crate::core::pipeline::signals::NextControl<Self::Output> {
            &self.n
        }

        fn n_mut(&mut self) -> &mut $crate::core::pipeline::signals::NextControl<Self::Output> {
            &mut self.n
        }

        fn ispec(&self) -> $crate::core::pipeline::record::Shape {
            self.stage.ispec()
        }

        fn ospec(&self) -> $crate::core::pipeline::record::Shape {
            self.stage.ospec()
        }
    };
}

/// Mask-tagged register stage with in-flight cancellation.
pub mod cancellable;

/// Queue-backed controllers (buffered handshake, register pipeline).
pub mod fifo;

/// Registered-output controller with a combinational ready path.
pub mod passthrough;

/// Busy-flag controller.
pub mod simple;

/// Input-register controller with a combinational output datapath.
pub mod unbuffered;

/// Combinational controller with an output skid buffer.
pub mod unbuffered2;

pub use cancellable::MaskCancellable;
pub use fifo::{BufferedHandshake, FifoControl, OnRead, OnWrite, ProcessMode, RegisterPipeline};
pub use passthrough::PassThroughHandshake;
pub use simple::SimpleHandshake;
pub use unbuffered::UnbufferedPipeline;
pub use unbuffered2::UnbufferedPipeline2;

use crate::common::BuildError;
use crate::config::{ControllerKind, QueueConfig};
use crate::core::pipeline::traits::{Pipe, Stage};

/// A controller chosen at run time, boxed behind the [`Pipe`] interface.
pub type DynController<I, O> = Box<dyn Pipe<Input = I, Output = O>>;

/// Wraps `stage` in the controller `kind` names.
///
/// `queue` only matters for [`ControllerKind::Fifo`].
///
/// # Errors
///
/// [`BuildError::ZeroDepth`] when a FIFO is requested with a zero-depth queue.
pub fn wrap<S: Stage + 'static>(
    kind: ControllerKind,
    stage: S,
    queue: &QueueConfig,
) -> Result<DynController<S::Input, S::Output>, BuildError> {
    Ok(match kind {
        ControllerKind::Unbuffered => Box::new(UnbufferedPipeline::new(stage)),
        ControllerKind::Unbuffered2 => Box::new(UnbufferedPipeline2::new(stage)),
        ControllerKind::Simple => Box::new(SimpleHandshake::new(stage)),
        ControllerKind::PassThrough => Box::new(PassThroughHandshake::new(stage)),
        ControllerKind::Register => Box::new(FifoControl::<S, OnWrite>::new(stage, 1, false, true)?),
        ControllerKind::Buffered => Box::new(BufferedHandshake::buffered(stage)),
        ControllerKind::Fifo => Box::new(FifoControl::<S, OnWrite>::from_config(stage, queue)?),
        ControllerKind::MaskCancellable => Box::new(MaskCancellable::new(stage)),
    })
}
