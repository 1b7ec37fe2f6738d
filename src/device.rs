use candle_core::Device;
use once_cell::sync::Lazy;

/// Process-wide tensor device. The networks here are tiny, so CPU is the
/// expected case; CUDA is picked up opportunistically when present.
pub static DEVICE: Lazy<Device> = Lazy::new(|| match Device::new_cuda(0) {
    Ok(device) => device,
    Err(_) => Device::Cpu,
});
