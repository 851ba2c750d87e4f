pub const MAX_PURPOSE_LENGTH: usize = 255;
pub const MAX_NAME_LENGTH: usize = 150;
pub const MAX_PHONE_LENGTH: usize = 15;
pub const MAX_TEXT_LENGTH: usize = 2000;
