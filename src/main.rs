#![cfg_attr(target_arch = "avr", no_std, no_main, feature(abi_avr_interrupt))]

#[cfg(target_arch = "avr")]
mod firmware {
    use panic_halt as _;

    use atmega128_bootloader::bootloader::{self, Bootloader, Takeover};
    use atmega128_bootloader::drivers::SerialConsole;
    use atmega128_bootloader::hal::avr::{
        uart, BootVectors, Cpu, ResetVector, Spm, Tc0Delay, Tc1Deadline, UsartRx, UsartTx,
    };
    use atmega128_bootloader::protocol::SerialLink;

    #[avr_device::entry]
    fn main() -> ! {
        // Use the bootloader's interrupt vectors
        BootVectors::claim();

        uart::init();
        let mut link = SerialLink::new(UsartRx::queue(), UsartTx);
        link.init();

        let bootloader = Bootloader::new(link, Spm, Cpu, Tc0Delay, Tc1Deadline, ResetVector);

        unsafe { avr_device::interrupt::enable() };

        bootloader.run()
    }

    #[avr_device::interrupt(atmega128a)]
    fn USART0_RX() {
        UsartRx::on_receive();
    }

    // Nobody asked for a session in time: start whatever is in flash
    #[avr_device::interrupt(atmega128a)]
    fn TIMER1_COMPA() {
        let mut console = SerialConsole::new(UsartTx);
        bootloader::hand_off(
            &mut console,
            &mut Takeover::running(Tc1Deadline),
            &mut Cpu,
            &mut ResetVector,
        )
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {
    eprintln!("atmega128_bootloader is firmware; build it for an avr target (e.g. avr-atmega128)");
}
