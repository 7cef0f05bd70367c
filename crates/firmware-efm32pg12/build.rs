// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let out = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR not set"));
    for script in ["memory.x", "device.x"] {
        fs::copy(script, out.join(script)).expect("failed to copy linker script");
        println!("cargo:rerun-if-changed={}", script);
    }
    println!("cargo:rustc-link-search={}", out.display());
}
