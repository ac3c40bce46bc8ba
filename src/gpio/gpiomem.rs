// Copyright (c) 2017-2021 Rene van der Meer
//
// Permission is hereby granted, free of charge, to any person obtaining a
// copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
// THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
// DEALINGS IN THE SOFTWARE.

use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};

use libc::{self, c_void, off_t, size_t, MAP_FAILED, MAP_SHARED, O_SYNC, PROT_READ, PROT_WRITE};

use super::regmap::{check_offset, RegisterMap, GPIO_REGION_SIZE, REG_SIZE};
use crate::gpio::{Error, Result};

const PATH_DEV_GPIOMEM: &str = "/dev/gpiomem";
const PATH_DEV_MEM: &str = "/dev/mem";

// Used to limit GpioMem to a single live mapping
static MAPPED: AtomicBool = AtomicBool::new(false);

/// Memory-mapped view of the hardware GPIO register block.
///
/// The mapping is released when `GpioMem` goes out of scope.
pub struct GpioMem {
    mem_ptr: *mut u32,
    base: u64,
    size: usize,
}

impl fmt::Debug for GpioMem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpioMem")
            .field("mem_ptr", &self.mem_ptr)
            .field("base", &format_args!("{:#x}", self.base))
            .field("size", &self.size)
            .finish()
    }
}

impl GpioMem {
    /// Maps `size` bytes of the GPIO register block located at physical address `base`.
    ///
    /// Returns `Err(Error::InvalidConfig)` if `size` doesn't cover the GPIO
    /// registers, and `Err(Error::InstanceExists)` if the block is already
    /// mapped by this process.
    pub fn open(base: u64, size: usize) -> Result<GpioMem> {
        if size < GPIO_REGION_SIZE {
            return Err(Error::InvalidConfig(format!(
                "mapping of {} bytes doesn't cover the {}-byte GPIO region",
                size, GPIO_REGION_SIZE
            )));
        }

        if MAPPED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::InstanceExists);
        }

        match Self::map(base, size) {
            Ok(mem_ptr) => {
                log::debug!("Mapped GPIO block {:#x} ({} bytes) at {:p}", base, size, mem_ptr);

                Ok(GpioMem {
                    mem_ptr,
                    base,
                    size,
                })
            }
            Err(e) => {
                MAPPED.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    fn map(base: u64, size: usize) -> Result<*mut u32> {
        // Try /dev/gpiomem first. If that fails, try /dev/mem instead. If neither works,
        // report back the error that's the most relevant.
        match Self::map_devgpiomem(size) {
            Ok(ptr) => Ok(ptr),
            Err(gpiomem_err) => {
                log::warn!(
                    "Can't map {} ({}), falling back to {}",
                    PATH_DEV_GPIOMEM,
                    gpiomem_err,
                    PATH_DEV_MEM
                );

                match Self::map_devmem(base, size) {
                    Ok(ptr) => Ok(ptr),
                    Err(Error::Io(ref e)) if e.kind() == io::ErrorKind::PermissionDenied => {
                        // Solving /dev/gpiomem issues (add user to the gpio group) should be
                        // preferred over /dev/mem (use sudo).
                        match gpiomem_err {
                            Error::Io(ref e) if e.kind() == io::ErrorKind::PermissionDenied => {
                                Err(Error::PermissionDenied(String::from(PATH_DEV_GPIOMEM)))
                            }
                            _ => Err(Error::PermissionDenied(String::from(PATH_DEV_MEM))),
                        }
                    }
                    Err(_) => Err(gpiomem_err),
                }
            }
        }
    }

    fn map_devgpiomem(size: usize) -> Result<*mut u32> {
        // /dev/gpiomem exposes the GPIO block at offset 0. Opening it fails if
        // the device doesn't exist, or the current user isn't a member of the
        // gpio group.
        let gpiomem_file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(O_SYNC)
            .open(PATH_DEV_GPIOMEM)?;

        Self::mmap(gpiomem_file.as_raw_fd(), size, 0)
    }

    fn map_devmem(base: u64, size: usize) -> Result<*mut u32> {
        let mem_file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(O_SYNC)
            .open(PATH_DEV_MEM)?;

        Self::mmap(mem_file.as_raw_fd(), size, base as off_t)
    }

    fn mmap(fd: libc::c_int, size: usize, offset: off_t) -> Result<*mut u32> {
        let mem_ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                size,
                PROT_READ | PROT_WRITE,
                MAP_SHARED,
                fd,
                offset,
            )
        };

        if mem_ptr == MAP_FAILED {
            return Err(Error::Io(io::Error::last_os_error()));
        }

        Ok(mem_ptr as *mut u32)
    }

    /// Physical address of the mapped block.
    pub fn base(&self) -> u64 {
        self.base
    }
}

impl RegisterMap for GpioMem {
    fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    fn read_word(&self, offset: usize) -> u32 {
        check_offset(offset, self.size);

        unsafe { ptr::read_volatile(self.mem_ptr.add(offset / REG_SIZE)) }
    }

    #[inline(always)]
    fn write_word(&self, offset: usize, value: u32) {
        check_offset(offset, self.size);

        unsafe {
            ptr::write_volatile(self.mem_ptr.add(offset / REG_SIZE), value);
        }
    }
}

impl Drop for GpioMem {
    fn drop(&mut self) {
        let retval = unsafe { libc::munmap(self.mem_ptr as *mut c_void, self.size as size_t) };

        if let Err(e) = parse_retval!(retval) {
            log::error!("Can't unmap GPIO block {:#x}: {}", self.base, e);
        }

        MAPPED.store(false, Ordering::SeqCst);
    }
}

// Required because of the raw pointer to our memory-mapped file
unsafe impl Send for GpioMem {}
unsafe impl Sync for GpioMem {}
