// One-time-password entry: six single-digit slots with focus handling, plus
// the countdown used for code expiry and the resend cooldown.

pub const OTP_LENGTH: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpInput {
    slots: [Option<char>; OTP_LENGTH],
    focus: usize,
}

impl OtpInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn set_focus(&mut self, index: usize) {
        self.focus = index.min(OTP_LENGTH - 1);
    }

    pub fn slots(&self) -> &[Option<char>; OTP_LENGTH] {
        &self.slots
    }

    /// Types one character into the focused slot. Non-digits are ignored.
    pub fn input(&mut self, ch: char) {
        if !ch.is_ascii_digit() {
            return;
        }
        self.slots[self.focus] = Some(ch);
        if self.focus < OTP_LENGTH - 1 {
            self.focus += 1;
        }
    }

    /// Clears a filled slot in place; on an empty slot moves focus back.
    pub fn backspace(&mut self) {
        if self.slots[self.focus].is_some() {
            self.slots[self.focus] = None;
        } else if self.focus > 0 {
            self.focus -= 1;
        }
    }

    /// Replaces the whole code: slots past the pasted digits are emptied.
    /// Anything but digits (after trimming) leaves the group untouched and
    /// returns false.
    pub fn paste(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        let mut digits = text.chars();
        let mut filled = 0;
        for slot in self.slots.iter_mut() {
            *slot = digits.next();
            filled += usize::from(slot.is_some());
        }
        self.focus = filled.min(OTP_LENGTH - 1);
        true
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn code(&self) -> Option<String> {
        self.slots.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Whole-second countdown driven by the caller's one-second tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    duration: u32,
    remaining: u32,
}

impl Countdown {
    pub fn new(seconds: u32) -> Self {
        Self {
            duration: seconds,
            remaining: seconds,
        }
    }

    pub fn tick(&mut self) -> u32 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_elapsed(&self) -> bool {
        self.remaining == 0
    }

    pub fn restart(&mut self) {
        self.remaining = self.duration;
    }

    /// Restarts with a new duration (the server may shorten or extend it).
    pub fn restart_with(&mut self, seconds: u32) {
        self.duration = seconds;
        self.remaining = seconds;
    }

    /// `m:ss`
    pub fn label(&self) -> String {
        format!("{}:{:02}", self.remaining / 60, self.remaining % 60)
    }
}
