//! Simulated hardware backends.
//!
//! A [`SimulatedBoard`] describes which I2C devices acknowledge, which GPIO
//! lines are stuck, and which cameras exist. Every backend counts the
//! accesses it receives so tests can assert that nothing touched hardware.

use board_doc::platform::gpio::DEFAULT_CHIP;
use board_doc::platform::{GpioController, Hardware, HardwareError, I2cBus, VideoDevices};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// I2C buses and the addresses that acknowledge on each.
#[derive(Debug, Default)]
pub struct SimulatedI2c {
    buses: HashMap<u32, Vec<u16>>,
    detections: AtomicUsize,
}

impl SimulatedI2c {
    pub fn detect_count(&self) -> usize {
        self.detections.load(Ordering::SeqCst)
    }
}

impl I2cBus for SimulatedI2c {
    fn detect(&self, bus: u32, address: u16) -> Result<bool, HardwareError> {
        self.detections.fetch_add(1, Ordering::SeqCst);
        match self.buses.get(&bus) {
            Some(addresses) => Ok(addresses.contains(&address)),
            None => Err(HardwareError::Unavailable {
                resource: format!("/dev/i2c-{}", bus),
                reason: "no such device node".to_string(),
            }),
        }
    }
}

/// GPIO lines on the default chip; lines in `stuck_low` never go high.
#[derive(Debug, Default)]
pub struct SimulatedGpio {
    stuck_low: Vec<u32>,
    writes: Mutex<Vec<(u32, bool)>>,
}

impl SimulatedGpio {
    pub fn writes(&self) -> Vec<(u32, bool)> {
        self.writes.lock().unwrap().clone()
    }
}

impl GpioController for SimulatedGpio {
    fn write_and_read(&self, chip: &str, line: u32, value: bool) -> Result<bool, HardwareError> {
        if chip != DEFAULT_CHIP {
            return Err(HardwareError::Unavailable {
                resource: chip.to_string(),
                reason: "no such chip".to_string(),
            });
        }
        self.writes.lock().unwrap().push((line, value));
        Ok(value && !self.stuck_low.contains(&line))
    }
}

/// Camera device nodes with their reported name and bound driver.
#[derive(Debug, Default)]
pub struct SimulatedVideo {
    cameras: HashMap<String, (String, String)>,
    lookups: AtomicUsize,
}

impl SimulatedVideo {
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn camera(&self, device: &str) -> Result<&(String, String), HardwareError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.cameras.get(device).ok_or_else(|| HardwareError::Unavailable {
            resource: device.to_string(),
            reason: "no such device".to_string(),
        })
    }
}

impl VideoDevices for SimulatedVideo {
    fn exists(&self, device: &str) -> bool {
        self.camera(device).is_ok()
    }

    fn name(&self, device: &str) -> Result<String, HardwareError> {
        self.camera(device).map(|(name, _)| name.clone())
    }

    fn driver(&self, device: &str) -> Result<String, HardwareError> {
        self.camera(device).map(|(_, driver)| driver.clone())
    }
}

/// Builder for a simulated board.
#[derive(Debug, Default)]
pub struct SimulatedBoard {
    i2c: SimulatedI2c,
    gpio: SimulatedGpio,
    video: SimulatedVideo,
}

/// Handles to a built board's backends.
#[derive(Clone)]
pub struct BoardHandles {
    pub i2c: Arc<SimulatedI2c>,
    pub gpio: Arc<SimulatedGpio>,
    pub video: Arc<SimulatedVideo>,
}

impl BoardHandles {
    pub fn hardware(&self) -> Hardware {
        Hardware {
            i2c: self.i2c.clone(),
            gpio: self.gpio.clone(),
            video: self.video.clone(),
        }
    }

    /// Total backend accesses of any kind.
    pub fn access_count(&self) -> usize {
        self.i2c.detect_count() + self.gpio.writes().len() + self.video.lookup_count()
    }
}

impl SimulatedBoard {
    pub fn new() -> Self {
        SimulatedBoard::default()
    }

    /// An empty bus that exists but has no devices.
    pub fn with_i2c_bus(mut self, bus: u32) -> Self {
        self.i2c.buses.entry(bus).or_default();
        self
    }

    pub fn with_i2c_device(mut self, bus: u32, address: u16) -> Self {
        self.i2c.buses.entry(bus).or_default().push(address);
        self
    }

    pub fn with_stuck_gpio(mut self, line: u32) -> Self {
        self.gpio.stuck_low.push(line);
        self
    }

    pub fn with_camera(mut self, device: &str, name: &str, driver: &str) -> Self {
        self.video
            .cameras
            .insert(device.to_string(), (name.to_string(), driver.to_string()));
        self
    }

    pub fn build(self) -> BoardHandles {
        BoardHandles {
            i2c: Arc::new(self.i2c),
            gpio: Arc::new(self.gpio),
            video: Arc::new(self.video),
        }
    }
}

/// A board with one display at 0x3c on bus 1, a working GPIO chip and one
/// USB camera at /dev/video0.
pub fn reference_board() -> BoardHandles {
    SimulatedBoard::new()
        .with_i2c_device(1, 0x3c)
        .with_i2c_device(1, 0x50)
        .with_i2c_bus(2)
        .with_camera("/dev/video0", "USB Camera", "uvcvideo")
        .build()
}
