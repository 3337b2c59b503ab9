//! Threshold entry decisions on the standardized residual.

use super::position::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Enter(Direction),
    NoAction,
}

/// z below -threshold buys the stock, z above +threshold sells it. Nothing is
/// entered while the pair already has an open position.
pub fn generate_signal(z: f64, has_open_position: bool, entry_threshold: f64) -> Signal {
    if has_open_position {
        return Signal::NoAction;
    }
    if z < -entry_threshold {
        Signal::Enter(Direction::Long)
    } else if z > entry_threshold {
        Signal::Enter(Direction::Short)
    } else {
        Signal::NoAction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_extreme_goes_long() {
        assert_eq!(generate_signal(-2.5, false, 2.0), Signal::Enter(Direction::Long));
    }

    #[test]
    fn positive_extreme_goes_short() {
        assert_eq!(generate_signal(3.0, false, 2.0), Signal::Enter(Direction::Short));
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(generate_signal(2.0, false, 2.0), Signal::NoAction);
        assert_eq!(generate_signal(-2.0, false, 2.0), Signal::NoAction);
    }

    #[test]
    fn inside_band_is_no_action() {
        assert_eq!(generate_signal(0.3, false, 2.0), Signal::NoAction);
    }

    #[test]
    fn open_position_blocks_entry() {
        assert_eq!(generate_signal(5.0, true, 2.0), Signal::NoAction);
        assert_eq!(generate_signal(-5.0, true, 2.0), Signal::NoAction);
    }
}
