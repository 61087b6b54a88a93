//! Thin façade over intra-process (thread) or inter-process (MPI) message
//! passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees). All
//! handles are **waitable** but non-blocking — the exchange engine calls
//! `.wait()` before it trusts that a buffer is ready. Posting every receive
//! before any send, then waiting, is what keeps the bidirectional halo
//! exchange deadlock-free regardless of how the peer orders its own calls.

use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Non-blocking communication interface (minimal by design).
pub trait Communicator: Send + Sync + 'static {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;

    /// This process's rank in the communicator.
    fn rank(&self) -> usize;

    /// True only for the no-op backend; lets callers skip handshakes that
    /// can never complete without a peer.
    fn is_no_comm(&self) -> bool {
        false
    }
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

/// Compile-time no-op comm for pure serial unit tests.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) {}

    fn rank(&self) -> usize {
        0
    }

    fn is_no_comm(&self) -> bool {
        true
    }
}

// --- ThreadComm: intra-process / multi-thread ---
type Key = (usize, usize, u16); // (src, dst, tag)

/// Per-(src, dst, tag) FIFO queues. Queue semantics (not a single slot) are
/// load-bearing: the iteration loop reuses the same tag every pass, and a
/// rank that runs ahead may post pass N+1's border before its neighbor has
/// consumed pass N's.
static MAILBOX: Lazy<DashMap<Key, VecDeque<Bytes>>> = Lazy::new(DashMap::new);

pub struct LocalHandle {
    buf: Arc<Mutex<Option<Vec<u8>>>>,
    handle: Option<JoinHandle<()>>,
}

impl Wait for LocalHandle {
    fn wait(mut self) -> Option<Vec<u8>> {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let mut guard = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        guard.take()
    }
}

/// In-process backend: each simulated rank runs on its own thread and posts
/// through the global mailbox. Used by the multi-rank integration tests.
#[derive(Clone, Debug)]
pub struct ThreadComm {
    rank: usize,
}

impl ThreadComm {
    pub fn new(rank: usize) -> Self {
        Self { rank }
    }

    /// Drop all queued messages. Tests call this between scenarios so a
    /// failed run cannot leak traffic into the next one.
    pub fn reset_mailbox() {
        MAILBOX.clear();
    }
}

impl Communicator for ThreadComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
        let key = (self.rank, peer, tag);
        MAILBOX
            .entry(key)
            .or_default()
            .push_back(Bytes::from(buf.to_vec()));
    }

    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> LocalHandle {
        let key = (peer, self.rank, tag);
        let buf_arc = Arc::new(Mutex::new(None));
        let buf_arc_clone = buf_arc.clone();
        // deliver the full message even if it disagrees with the posted
        // buffer length; callers length-check and report the mismatch
        let handle = std::thread::spawn(move || {
            loop {
                let msg = MAILBOX.get_mut(&key).and_then(|mut q| q.pop_front());
                if let Some(bytes) = msg {
                    let mut guard = buf_arc_clone.lock().unwrap_or_else(|e| e.into_inner());
                    *guard = Some(bytes.to_vec());
                    break;
                }
                std::thread::yield_now();
            }
        });
        LocalHandle {
            buf: buf_arc,
            handle: Some(handle),
        }
    }

    fn rank(&self) -> usize {
        self.rank
    }
}

/// Spawn `ranks` threads, one simulated rank each, and join their results.
///
/// Panics from rank bodies are propagated. Intended for tests and demos; a
/// real run uses one OS process per rank via [`MpiComm`].
pub fn with_thread_ranks<T, F>(ranks: usize, body: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(ThreadComm) -> T + Send + Sync + 'static,
{
    let body = Arc::new(body);
    let (tx, rx) = mpsc::channel();
    let mut handles = Vec::with_capacity(ranks);
    for rank in 0..ranks {
        let body = body.clone();
        let tx = tx.clone();
        handles.push(std::thread::spawn(move || {
            let out = body(ThreadComm::new(rank));
            let _ = tx.send((rank, out));
        }));
    }
    drop(tx);
    for h in handles {
        h.join().expect("rank thread panicked");
    }
    let mut results: Vec<(usize, T)> = rx.into_iter().collect();
    results.sort_by_key(|(rank, _)| *rank);
    results.into_iter().map(|(_, out)| out).collect()
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::Wait;
    use mpi::request::{Request, StaticScope};
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    /// One OS process per rank, non-blocking sends/receives over MPI.
    pub struct MpiComm {
        universe: Option<mpi::environment::Universe>,
        world: SimpleCommunicator,
        rank: usize,
    }

    impl MpiComm {
        /// Initialize MPI and bind to the world communicator.
        ///
        /// Returns `None` if MPI was already initialized elsewhere in the
        /// process.
        pub fn new() -> Option<Self> {
            let universe = mpi::initialize()?;
            let world = universe.world();
            let rank = world.rank() as usize;
            Some(Self {
                universe: Some(universe),
                world,
                rank,
            })
        }

        pub fn size(&self) -> usize {
            self.world.size() as usize
        }
    }

    impl Drop for MpiComm {
        fn drop(&mut self) {
            // Universe finalizes MPI when dropped.
            let _ = self.universe.take();
        }
    }

    /// Send in flight; the leaked buffer is reclaimed on wait.
    pub struct MpiSendHandle {
        req: Request<'static, [u8], StaticScope>,
        buf: *mut [u8],
    }

    unsafe impl Send for MpiSendHandle {}

    impl Wait for MpiSendHandle {
        fn wait(self) -> Option<Vec<u8>> {
            self.req.wait_without_status();
            // Safety: the request completed, MPI no longer references the buffer.
            unsafe { drop(Box::from_raw(self.buf)) };
            None
        }
    }

    /// Receive in flight; yields the received bytes on wait.
    pub struct MpiRecvHandle {
        req: Request<'static, [u8], StaticScope>,
        buf: *mut [u8],
    }

    unsafe impl Send for MpiRecvHandle {}

    impl Wait for MpiRecvHandle {
        fn wait(self) -> Option<Vec<u8>> {
            self.req.wait_without_status();
            // Safety: the request completed, MPI no longer references the buffer.
            let boxed = unsafe { Box::from_raw(self.buf) };
            Some(boxed.into_vec())
        }
    }

    impl super::Communicator for MpiComm {
        type SendHandle = MpiSendHandle;
        type RecvHandle = MpiRecvHandle;

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiSendHandle {
            let data: &'static mut [u8] = Box::leak(buf.to_vec().into_boxed_slice());
            let ptr = data as *mut [u8];
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_send_with_tag(StaticScope, &*data, tag as i32);
            MpiSendHandle { req, buf: ptr }
        }

        fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> MpiRecvHandle {
            let data: &'static mut [u8] = Box::leak(vec![0u8; buf.len()].into_boxed_slice());
            let ptr = data as *mut [u8];
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_receive_into_with_tag(StaticScope, data, tag as i32);
            MpiRecvHandle { req, buf: ptr }
        }

        fn rank(&self) -> usize {
            self.rank
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
