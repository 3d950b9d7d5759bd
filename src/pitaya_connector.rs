//! Access to the oscilloscope FPGA module through `/dev/mem`.
#![allow(unsafe_code)]

use std::fs::{File, OpenOptions};
use std::io;
use std::num::NonZeroUsize;
use std::ptr::{self, NonNull};

use libc::c_void;
use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};

use crate::registers::{Channel, Register, RegisterInterface, OSC_BASE, OSC_BASE_SIZE};
use crate::ring_buffer::RingIndex;

const DEV_MEM: &str = "/dev/mem";
const WORD: usize = std::mem::size_of::<u32>();

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("Cannot open /dev/mem. Run as root or add the user to the kmem group: {0}")]
    PermissionDenied(io::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Mapping the oscilloscope page at 0x{base:08x} failed: {source}")]
    Map { base: usize, source: nix::Error },

    #[error("Unmapping the oscilloscope page failed: {0}")]
    Unmap(nix::Error),

    #[error("Mapping of 0x{size:x} bytes cannot hold the oscilloscope module (0x{required:x} bytes)")]
    WindowTooSmall { size: usize, required: usize },
}

pub struct PitayaConnector;

impl PitayaConnector {
    /// Maps the oscilloscope page at its fixed physical address.
    pub fn connect() -> Result<MappedOscilloscope, ConnectorError> {
        Self::connect_at(OSC_BASE, OSC_BASE_SIZE)
    }

    /// Maps `size` bytes at `phys_base`. The window must cover the register
    /// page and both sample buffers.
    pub fn connect_at(phys_base: usize, size: usize) -> Result<MappedOscilloscope, ConnectorError> {
        check_window(size)?;
        log::debug!("Mapping oscilloscope page 0x{phys_base:08x} (+0x{size:x}) from {DEV_MEM}");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(DEV_MEM)
            .map_err(|e| match e.kind() {
                io::ErrorKind::PermissionDenied => ConnectorError::PermissionDenied(e),
                _ => ConnectorError::Io(e),
            })?;

        let page_size = page_size();
        let page_offset = phys_base & (page_size - 1);
        let aligned_base = phys_base - page_offset;
        let aligned_size = NonZeroUsize::new(size + page_offset)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty mapping"))?;

        // SAFETY: a fresh shared mapping of a device page; nothing else in the
        // process aliases it.
        let mapping = unsafe {
            mmap(
                None,
                aligned_size,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                &file,
                aligned_base as libc::off_t,
            )
        }
        .map_err(|source| ConnectorError::Map {
            base: phys_base,
            source,
        })?;

        Ok(MappedOscilloscope {
            mapping,
            mapped_len: aligned_size.get(),
            page_offset,
            size,
            _file: file,
        })
    }
}

fn check_window(size: usize) -> Result<(), ConnectorError> {
    if size < OSC_BASE_SIZE {
        return Err(ConnectorError::WindowTooSmall {
            size,
            required: OSC_BASE_SIZE,
        });
    }
    Ok(())
}

fn page_size() -> usize {
    // SAFETY: sysconf has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        4096
    }
}

/// The oscilloscope register page mapped into this process.
pub struct MappedOscilloscope {
    mapping: NonNull<c_void>,
    mapped_len: usize,
    page_offset: usize,
    size: usize,
    _file: File,
}

impl MappedOscilloscope {
    /// Pointer to the word at `byte_offset`, `None` outside the mapping.
    fn word_ptr(&self, byte_offset: usize) -> Option<*mut u32> {
        if byte_offset.checked_add(WORD)? > self.size {
            log::error!("Offset 0x{byte_offset:x} outside the 0x{:x} byte mapping", self.size);
            return None;
        }
        // SAFETY: byte_offset + WORD <= size, and size + page_offset bytes
        // are mapped.
        Some(unsafe {
            self.mapping
                .as_ptr()
                .cast::<u8>()
                .add(self.page_offset + byte_offset)
                .cast::<u32>()
        })
    }

    fn unmap(&mut self) -> Result<(), ConnectorError> {
        // SAFETY: mapping and mapped_len come from the successful mmap call
        // and the mapping is not used afterwards.
        unsafe { munmap(self.mapping, self.mapped_len) }.map_err(ConnectorError::Unmap)
    }
}

impl RegisterInterface for MappedOscilloscope {
    fn read_register(&mut self, register: Register) -> u32 {
        match self.word_ptr(register.offset()) {
            // SAFETY: word_ptr only hands out aligned words inside the mapping.
            Some(word) => unsafe { ptr::read_volatile(word) },
            None => 0,
        }
    }

    fn write_register(&mut self, register: Register, value: u32) {
        if let Some(word) = self.word_ptr(register.offset()) {
            // SAFETY: as in read_register.
            unsafe { ptr::write_volatile(word, value) }
        }
    }

    fn read_sample(&self, channel: Channel, index: RingIndex) -> u32 {
        match self.word_ptr(channel.buffer_offset() + index.get() * WORD) {
            // SAFETY: as in read_register.
            Some(word) => unsafe { ptr::read_volatile(word) },
            None => 0,
        }
    }
}

impl Drop for MappedOscilloscope {
    fn drop(&mut self) {
        if let Err(e) = self.unmap() {
            log::error!("{e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::Calibrator;

    #[test]
    fn test_page_size_is_power_of_two() {
        assert!(page_size().is_power_of_two());
    }

    #[test]
    fn test_window_must_cover_both_sample_buffers() {
        assert!(matches!(
            PitayaConnector::connect_at(OSC_BASE, 0x1000),
            Err(ConnectorError::WindowTooSmall {
                size: 0x1000,
                required: OSC_BASE_SIZE
            })
        ));
        assert!(check_window(OSC_BASE_SIZE).is_ok());
        let last_sample = Channel::B.buffer_offset() + (crate::ring_buffer::BUF - 1) * WORD;
        assert!(last_sample + WORD <= OSC_BASE_SIZE);
    }

    #[test]
    #[ignore = "needs root and the oscilloscope FPGA image"]
    fn test_hardware_calibration() {
        let mut scope = PitayaConnector::connect().unwrap();
        let report = Calibrator::new().measure_both(&mut scope);
        println!("{report}");
    }
}
