use crate::acquisition::driver::Image;
use crate::acquisition::timestamp::Timestamp;

/// One captured frame: raw buffer, converted buffer and decoded timestamp share an index.
#[derive(Debug, Clone, Default)]
pub struct ImageSlot {
    pub raw: Option<Image>,
    pub converted: Option<Image>,
    pub timestamp: Option<Timestamp>,
}

impl ImageSlot {
    pub fn is_filled(&self) -> bool {
        self.raw.is_some()
    }

    pub fn clear(&mut self) {
        self.raw = None;
        self.converted = None;
        self.timestamp = None;
    }
}
