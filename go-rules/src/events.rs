use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::Point;
use crate::board_position::PositionStep;
use crate::game::GameState;
use crate::score::Score;
use crate::stone::Stone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    BoardPosition,
    Game,
    Scoring,
    Setup,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// One node applied or reverted on the way to a new position.
    BoardPositionStep(PositionStep),
    BoardPositionChanged { position: usize },
    NumberOfPositionsChanged { count: usize },
    GameStateChanged(GameState),
    ScoringStarted,
    ScoringEnded,
    ScoreCalculated(Box<Score>),
    HandicapPointsChanged(Vec<Point>),
    SetupPointChanged { point: Point, stone: Option<Stone> },
    SetupFirstMoveColorChanged(Option<Stone>),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::BoardPositionStep(_)
            | Event::BoardPositionChanged { .. }
            | Event::NumberOfPositionsChanged { .. } => Topic::BoardPosition,
            Event::GameStateChanged(_) | Event::HandicapPointsChanged(_) => Topic::Game,
            Event::ScoringStarted | Event::ScoringEnded | Event::ScoreCalculated(_) => {
                Topic::Scoring
            }
            Event::SetupPointChanged { .. } | Event::SetupFirstMoveColorChanged(_) => Topic::Setup,
        }
    }
}

/// Fans events out to subscribers over unbounded channels. A subscriber
/// that dropped its receiver is forgotten on the next publish.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<(Option<Topic>, Sender<Event>)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, topic: Topic) -> Receiver<Event> {
        let (tx, rx) = unbounded();
        self.subscribers.push((Some(topic), tx));
        rx
    }

    pub fn subscribe_all(&mut self) -> Receiver<Event> {
        let (tx, rx) = unbounded();
        self.subscribers.push((None, tx));
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn publish(&mut self, event: Event) {
        let topic = event.topic();
        self.subscribers.retain(|(filter, tx)| {
            if filter.is_some_and(|f| f != topic) {
                return true;
            }
            tx.send(event.clone()).is_ok()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_by_topic() {
        let mut bus = EventBus::new();
        let positions = bus.subscribe(Topic::BoardPosition);
        let everything = bus.subscribe_all();

        bus.publish(Event::BoardPositionChanged { position: 3 });
        bus.publish(Event::ScoringStarted);

        assert_eq!(
            positions.try_iter().collect::<Vec<_>>(),
            vec![Event::BoardPositionChanged { position: 3 }]
        );
        assert_eq!(everything.try_iter().count(), 2);
    }

    #[test]
    fn prunes_dropped_subscribers() {
        let mut bus = EventBus::new();
        let kept = bus.subscribe(Topic::Setup);
        drop(bus.subscribe(Topic::Setup));
        let other = bus.subscribe(Topic::Scoring);
        drop(other);
        assert_eq!(bus.subscriber_count(), 3);

        bus.publish(Event::SetupFirstMoveColorChanged(Some(Stone::White)));
        // The scoring subscriber is only noticed once a scoring event is sent.
        assert_eq!(bus.subscriber_count(), 2);
        bus.publish(Event::ScoringEnded);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_iter().count(), 1);
    }
}
