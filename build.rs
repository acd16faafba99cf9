use std::env;

fn main() {
    let target = env::var("TARGET").unwrap_or_default();

    // Host builds only compile the portable core (and its tests)
    if !target.contains("avr") {
        return;
    }

    // Configure for ATmega128
    println!("cargo:rustc-link-arg=-mmcu=atmega128");

    // The bootloader lives in the 8K boot section (BOOTSZ = 00, word address 0xF000)
    println!("cargo:rustc-link-arg=-Wl,--section-start=.text=0x1E000");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:warning=Building bootloader for ATmega128 at 16MHz");
}
