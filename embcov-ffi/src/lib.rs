//! The gcov entry points GCC instrumented code calls, backed by one process-wide
//! [`Runtime`].
//!
//! Link the static library into the firmware and call `__gcov_exit` wherever the
//! coverage data should be extracted. Which sinks are written, where memory for
//! the registry comes from and what happens on failure is decided by cargo
//! features, see `Cargo.toml`.
//!
//! Without `std` the firmware has to provide `embcov_putchar` for console output,
//! and a global allocator if `heap` is enabled.
//!
//! Everything here assumes a single thread of execution: registration happens
//! during startup, emission at a single shutdown point.

#![cfg_attr(not(feature = "std"), no_std)]

use core::cell::UnsafeCell;

use embcov::{
    config,
    error::Error,
    gcc::GcovInfo,
    gcov::{GcovType, GcovUnsigned},
    sink::Sink,
    FailurePolicy, Runtime,
};
use log::info;

cfg_if::cfg_if! {
    if #[cfg(feature = "heap")] {
        use embcov::{registry::HeapPool, scratch::HeapScratch};

        type Pool = HeapPool<'static>;
        type Buffer = HeapScratch;

        const fn pool() -> Pool {
            HeapPool::new()
        }

        const fn buffer() -> Buffer {
            HeapScratch::new()
        }
    } else {
        use embcov::{registry::FixedPool, scratch::FixedScratch};

        type Pool = FixedPool<'static, { config::POOL_ENTRIES }>;
        type Buffer = FixedScratch<{ config::SCRATCH_WORDS }>;

        const fn pool() -> Pool {
            FixedPool::new()
        }

        const fn buffer() -> Buffer {
            FixedScratch::new()
        }
    }
}

const POLICY: FailurePolicy = if cfg!(feature = "exit-on-error") {
    FailurePolicy::Exit
} else {
    FailurePolicy::Return
};

type DefaultRuntime = Runtime<'static, Pool, Buffer>;

/// Process-wide state without locking.
struct Global<T>(UnsafeCell<T>);

// SAFETY: accessed from a single thread only, see `Global::get`.
unsafe impl<T> Sync for Global<T> {}

impl<T> Global<T> {
    const fn new(value: T) -> Self {
        Global(UnsafeCell::new(value))
    }

    /// # Safety
    ///
    /// No other reference obtained from this function may be alive.
    #[allow(clippy::mut_from_ref)]
    unsafe fn get(&self) -> &mut T {
        &mut *self.0.get()
    }
}

static RUNTIME: Global<DefaultRuntime> = Global::new(Runtime::new(pool(), buffer(), POLICY));

#[cfg(feature = "sink-memory")]
static OUTPUT_BLOCK: Global<(usize, usize)> =
    Global::new((config::OUTPUT_BASE, config::OUTPUT_SIZE));

cfg_if::cfg_if! {
    if #[cfg(test)] {
        fn putchar(byte: u8) {
            tests::CONSOLE.with(|out| out.borrow_mut().push(byte));
        }
    } else if #[cfg(feature = "std")] {
        fn putchar(byte: u8) {
            use embcov::printf::Console;

            embcov::printf::StdoutConsole.put(byte);
        }
    } else {
        extern "C" {
            /// Writes one byte to the console, provided by the firmware.
            fn embcov_putchar(byte: u8);
        }

        fn putchar(byte: u8) {
            // SAFETY: contract of the firmware provided function.
            unsafe { embcov_putchar(byte) }
        }

        #[cfg(not(test))]
        #[panic_handler]
        fn panic(_info: &core::panic::PanicInfo) -> ! {
            use embcov::printf::Console;

            embcov::printf::FnConsole(putchar).put_all(b"embcov: panic\n");
            loop {}
        }
    }
}

#[cfg(any(feature = "sink-hexdump", feature = "status"))]
fn console() -> embcov::printf::FnConsole {
    embcov::printf::FnConsole(putchar)
}

#[cfg(feature = "status")]
static LOGGER: embcov::logger::ConsoleLogger =
    embcov::logger::ConsoleLogger::new(putchar, log::LevelFilter::Info);

fn init_logging() {
    // An already installed logger wins.
    #[cfg(feature = "status")]
    let _ = embcov::logger::ConsoleLogger::init(&LOGGER);
}

/// Unused slot of the sink list.
struct Unused;

impl Sink for Unused {
    fn begin(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn record(&mut self, _name: &[u8], _record: &[u8]) -> Result<(), Error> {
        Ok(())
    }

    fn end(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

#[allow(unused_mut)]
unsafe fn emit(runtime: &mut DefaultRuntime) -> Result<usize, Error> {
    #[cfg(feature = "sink-file")]
    let mut file = embcov::sink::Envelope::new(embcov::sink::FileSink::new(config::OUTPUT_FILE));
    #[cfg(feature = "sink-memory")]
    let mut memory = {
        let (base, len) = *OUTPUT_BLOCK.get();
        embcov::sink::Envelope::new(embcov::sink::MemoryBlock::from_raw_parts(
            base as *mut u8,
            len,
        ))
    };
    #[cfg(feature = "sink-hexdump")]
    let mut hexdump = embcov::sink::HexDump::new(console());
    // The hex dump prints the same lines itself.
    #[cfg(all(feature = "status", not(feature = "sink-hexdump")))]
    let mut status = embcov::sink::Status::new(console());

    let mut unused = [Unused, Unused, Unused];
    let [a, b, c] = &mut unused;
    let mut sinks: [&mut dyn Sink; 3] = [a, b, c];
    let mut active = 0;

    #[cfg(feature = "sink-file")]
    {
        sinks[active] = &mut file;
        active += 1;
    }
    #[cfg(feature = "sink-memory")]
    {
        sinks[active] = &mut memory;
        active += 1;
    }
    #[cfg(feature = "sink-hexdump")]
    {
        sinks[active] = &mut hexdump;
        active += 1;
    }
    #[cfg(all(feature = "status", not(feature = "sink-hexdump")))]
    {
        sinks[active] = &mut status;
        active += 1;
    }

    runtime.emit_all(&mut sinks[..active])
}

/// Called by the constructor GCC generates for every instrumented unit.
///
/// # Safety
///
/// `info` must be null or a descriptor emitted by GCC that lives until the
/// program ends.
#[no_mangle]
pub unsafe extern "C" fn __gcov_init(info: *mut GcovInfo) {
    init_logging();

    let Some(info) = GcovInfo::from_ptr(info) else {
        return;
    };
    let runtime = RUNTIME.get();
    let result = runtime.register(info);
    runtime.check(result);
}

/// Writes the records of every registered unit to the enabled sinks.
///
/// # Safety
///
/// Must not run concurrently with any other entry point or with instrumented code.
#[no_mangle]
pub unsafe extern "C" fn __gcov_exit() {
    init_logging();
    info!("gcov_exit");

    let runtime = RUNTIME.get();
    let result = emit(runtime);
    runtime.check(result);
}

/// Zeroes every counter of every registered unit.
///
/// # Safety
///
/// Must not run concurrently with any other entry point or with instrumented code.
#[no_mangle]
pub unsafe extern "C" fn __gcov_clear() {
    info!("gcov_clear");
    RUNTIME.get().clear_all();
}

/// GCC references this for every arc counter, but merging is not supported.
///
/// # Safety
///
/// Must not run concurrently with any other entry point.
#[no_mangle]
pub unsafe extern "C" fn __gcov_merge_add(counters: *mut GcovType, n_counters: GcovUnsigned) {
    let runtime = RUNTIME.get();
    let result = runtime.merge_add(counters, n_counters);
    runtime.check(result);
}

/// Moves the output block of the memory sink.
///
/// # Safety
///
/// `len` bytes at `base` must be writable whenever `__gcov_exit` runs.
#[cfg(feature = "sink-memory")]
#[no_mangle]
pub unsafe extern "C" fn __gcov_set_output_block(base: *mut u8, len: usize) {
    *OUTPUT_BLOCK.get() = (base as usize, len);
}

#[cfg(feature = "call-constructors")]
type Constructor = Option<unsafe extern "C" fn()>;

#[cfg(feature = "call-constructors")]
extern "C" {
    static __ctor_list: Constructor;
    static __ctor_end: Constructor;
}

/// Runs the constructors between the linker symbols `__ctor_list` and
/// `__ctor_end`, for startup code that does not do it itself.
///
/// The registry is emptied first, so this may run again without a restart.
/// Counters are not cleared, call `__gcov_clear` for that.
///
/// # Safety
///
/// The linker script must place the constructor table between both symbols.
#[cfg(feature = "call-constructors")]
#[no_mangle]
pub unsafe extern "C" fn __gcov_call_constructors() {
    RUNTIME.get().reset();

    let mut ctor = core::ptr::addr_of!(__ctor_list);
    let end = core::ptr::addr_of!(__ctor_end);
    while ctor < end {
        if let Some(constructor) = *ctor {
            constructor();
        }
        ctor = ctor.add(1);
    }
}
