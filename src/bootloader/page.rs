//! Page-sized staging buffer between records and flash

use crate::config::ERASED_BYTE;

/// Collects record bytes for one flash page of `N` bytes.
///
/// Bytes may arrive in any order. Whenever a byte belongs to a different page
/// than the one being collected, the collected page is handed to `commit`
/// and a fresh, erased page is started.
pub struct PageBuffer<const N: usize> {
    start: Option<u16>,
    data: [u8; N],
}

impl<const N: usize> PageBuffer<N> {
    pub const fn new() -> Self {
        Self {
            start: None,
            data: [ERASED_BYTE; N],
        }
    }

    /// Stage `data` for the addresses starting at `address`.
    pub fn absorb<C>(&mut self, address: u16, data: &[u8], mut commit: C)
    where
        C: FnMut(u16, &[u8; N]),
    {
        for (i, &byte) in data.iter().enumerate() {
            let byte_address = address.wrapping_add(i as u16);

            let start = match self.start {
                Some(start) if Self::contains(start, byte_address) => start,
                Some(start) => {
                    commit(start, &self.data);
                    self.data = [ERASED_BYTE; N];
                    self.activate(byte_address)
                }
                None => self.activate(byte_address),
            };

            self.data[usize::from(byte_address - start)] = byte;
        }
    }

    /// Commit the page being collected, if any.
    pub fn finish<C>(&mut self, mut commit: C)
    where
        C: FnMut(u16, &[u8; N]),
    {
        if let Some(start) = self.start.take() {
            commit(start, &self.data);
            self.data = [ERASED_BYTE; N];
        }
    }

    /// Start address of the page being collected.
    pub fn start(&self) -> Option<u16> {
        self.start
    }

    fn activate(&mut self, address: u16) -> u16 {
        let start = address - address % N as u16;
        self.start = Some(start);
        start
    }

    fn contains(start: u16, address: u16) -> bool {
        address >= start && usize::from(address - start) < N
    }
}

impl<const N: usize> Default for PageBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: usize = 8;

    fn collect(buffer: &mut PageBuffer<PAGE>, writes: &[(u16, &[u8])]) -> Vec<(u16, [u8; PAGE])> {
        let mut pages = Vec::new();
        for &(address, data) in writes {
            buffer.absorb(address, data, |start, page| pages.push((start, *page)));
        }
        buffer.finish(|start, page| pages.push((start, *page)));
        pages
    }

    #[test]
    fn first_byte_selects_aligned_page() {
        let mut buffer = PageBuffer::<PAGE>::new();
        buffer.absorb(0x13, &[0xAB], |_, _| panic!("nothing to commit yet"));
        assert_eq!(buffer.start(), Some(0x10));
    }

    #[test]
    fn unfilled_bytes_stay_erased() {
        let pages = collect(&mut PageBuffer::new(), &[(0x02, &[1, 2])]);
        assert_eq!(pages, vec![(0x00, [0xFF, 0xFF, 1, 2, 0xFF, 0xFF, 0xFF, 0xFF])]);
    }

    #[test]
    fn record_spanning_boundary_spills_into_next_page() {
        let pages = collect(&mut PageBuffer::new(), &[(0x06, &[1, 2, 3, 4])]);
        assert_eq!(
            pages,
            vec![
                (0x00, [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 1, 2]),
                (0x08, [3, 4, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]),
            ]
        );
    }

    #[test]
    fn spill_keeps_earlier_bytes_of_first_page() {
        let pages = collect(&mut PageBuffer::new(), &[(0x00, &[9, 9]), (0x06, &[1, 2, 3, 4])]);
        assert_eq!(pages[0], (0x00, [9, 9, 0xFF, 0xFF, 0xFF, 0xFF, 1, 2]));
        assert_eq!(pages[1].0, 0x08);
    }

    #[test]
    fn order_within_page_does_not_matter() {
        let bytes: Vec<u8> = (0..PAGE as u8).map(|b| b * 3 + 1).collect();
        let ascending: Vec<(u16, &[u8])> =
            (0..PAGE).map(|i| (0x20 + i as u16, &bytes[i..=i])).collect();

        let orders: [[usize; PAGE]; 3] = [
            [7, 6, 5, 4, 3, 2, 1, 0],
            [3, 0, 6, 1, 7, 2, 5, 4],
            [1, 0, 3, 2, 5, 4, 7, 6],
        ];

        let reference = collect(&mut PageBuffer::new(), &ascending);
        assert_eq!(reference.len(), 1);

        for order in orders {
            let shuffled: Vec<(u16, &[u8])> = order.iter().map(|&i| ascending[i]).collect();
            assert_eq!(collect(&mut PageBuffer::new(), &shuffled), reference);
        }
    }

    #[test]
    fn going_backwards_commits_and_switches_page() {
        let pages = collect(&mut PageBuffer::new(), &[(0x10, &[1]), (0x08, &[2])]);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].0, 0x10);
        assert_eq!(pages[1], (0x08, [2, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]));
    }

    #[test]
    fn finish_without_data_commits_nothing() {
        let mut buffer = PageBuffer::<PAGE>::new();
        buffer.finish(|_, _| panic!("no page was started"));
        assert_eq!(buffer.start(), None);
    }

    #[test]
    fn finish_is_one_shot() {
        let mut buffer = PageBuffer::<PAGE>::new();
        let mut commits = 0;
        buffer.absorb(0, &[1], |_, _| {});
        buffer.finish(|_, _| commits += 1);
        buffer.finish(|_, _| commits += 1);
        assert_eq!(commits, 1);
    }
}
