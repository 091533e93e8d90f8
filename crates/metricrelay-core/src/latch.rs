//! 단발성 래치.
//!
//! 같은 실패가 반복될 때 진단 메시지를 한 번만 내보내기 위한 상태.
//! 레벨이 아니라 전이(transition)가 출력을 결정한다.

/// false→true 전이에서만 `trip()`이 true를 반환하는 래치
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Latch {
    set: bool,
}

impl Latch {
    pub const fn new() -> Self {
        Self { set: false }
    }

    /// 래치 설정. 이번 호출로 전이가 일어났으면 true.
    pub fn trip(&mut self) -> bool {
        !std::mem::replace(&mut self.set, true)
    }

    /// 래치 해제. 이번 호출로 전이가 일어났으면 true.
    pub fn reset(&mut self) -> bool {
        std::mem::replace(&mut self.set, false)
    }

    pub fn is_set(&self) -> bool {
        self.set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trip_reports_only_first_transition() {
        let mut latch = Latch::new();
        assert!(latch.trip());
        assert!(!latch.trip());
        assert!(!latch.trip());
        assert!(latch.is_set());
    }

    #[test]
    fn reset_rearms() {
        let mut latch = Latch::new();
        assert!(!latch.reset());
        latch.trip();
        assert!(latch.reset());
        assert!(!latch.is_set());
        assert!(latch.trip());
    }
}
