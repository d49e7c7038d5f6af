use candle_core::Device;
use tracing::{info, warn};

/// GPU backend a build can try to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Accelerator {
    Metal,
    Cuda,
}

impl Accelerator {
    #[cfg_attr(not(any(feature = "metal", feature = "cuda")), allow(dead_code))]
    fn open(self) -> candle_core::Result<Device> {
        match self {
            Self::Metal => Device::new_metal(0),
            Self::Cuda => Device::new_cuda(0),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Metal => "metal",
            Self::Cuda => "cuda",
        }
    }
}

/// Backends compiled into this build, in the order they are tried.
const COMPILED_ACCELERATORS: &[Accelerator] = &[
    #[cfg(feature = "metal")]
    Accelerator::Metal,
    #[cfg(feature = "cuda")]
    Accelerator::Cuda,
];

/// Picks the inference device once at startup: the first compiled-in
/// accelerator that opens, CPU otherwise.
pub fn select_device() -> Device {
    let mut failures = Vec::new();

    for accelerator in COMPILED_ACCELERATORS {
        match accelerator.open() {
            Ok(device) => {
                info!(backend = accelerator.label(), "Using GPU acceleration");
                return device;
            }
            Err(e) => {
                warn!(backend = accelerator.label(), error = %e, "GPU device unavailable");
                failures.push(format!("{}: {}", accelerator.label(), e));
            }
        }
    }

    let reason = if COMPILED_ACCELERATORS.is_empty() {
        "no GPU backend compiled".to_string()
    } else {
        failures.join("; ")
    };

    warn!(reason = %reason, "Falling back to CPU device");
    Device::Cpu
}

/// Short label for logs and the readiness endpoint.
pub fn device_label(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => Accelerator::Cuda.label(),
        Device::Metal(_) => Accelerator::Metal.label(),
    }
}
