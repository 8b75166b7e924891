//! Talking, heard by everyone within the loudness's reach.

use std::time::Duration;

use ironhold_core::{ExecutionResult, Operation, OperationContext, OperationError, OperationHeader, StandardOperation};
use ironhold_types::{Audience, CreatureId, ExhaustionCategory, OperationKind, Outbound, SpeechType};

/// A creature saying something.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Speech {
    speaker: CreatureId,
    speech_type: SpeechType,
    text: String,
}

impl Speech {
    /// `speaker` says `text` at the given loudness.
    pub fn new(speaker: CreatureId, speech_type: SpeechType, text: impl Into<String>) -> Self {
        Self {
            speaker,
            speech_type,
            text: text.into(),
        }
    }

    /// Wrap into a schedulable operation costing `cost`.
    pub fn into_operation(self, cost: Duration) -> Operation {
        let header =
            OperationHeader::new(OperationKind::Speech, ExhaustionCategory::Speech, Some(self.speaker)).with_cost(cost);
        Operation::standard(header, self)
    }
}

impl StandardOperation for Speech {
    fn execute(
        &mut self,
        _header: &mut OperationHeader,
        ctx: &mut OperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Ok(ExecutionResult::aborted());
        }
        let Some(speaker) = ctx.world().creature(self.speaker) else {
            return Ok(ExecutionResult::aborted());
        };
        let (name, center) = (speaker.name.clone(), speaker.position);

        let (range_x, range_y) = match self.speech_type {
            SpeechType::Whisper => {
                let reach = ctx.rules().speech.whisper_range;
                (reach, reach)
            }
            SpeechType::Say => {
                let settings = ctx.world().settings();
                (settings.view_range_x, settings.view_range_y)
            }
            SpeechType::Yell => (ctx.rules().speech.yell_range_x, ctx.rules().speech.yell_range_y),
        };
        let text = match self.speech_type {
            SpeechType::Yell => text.to_uppercase(),
            SpeechType::Whisper | SpeechType::Say => text.to_owned(),
        };

        ctx.notify(
            Audience::Spectators {
                center,
                range_x,
                range_y,
            },
            vec![Outbound::CreatureSpeech {
                creature: self.speaker,
                name,
                speech_type: self.speech_type,
                text,
            }],
        );
        Ok(ExecutionResult::performed())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ironhold_core::{Services, Simulation};
    use ironhold_types::{CreatureKind, GameTime, ItemTypeId, Position};
    use ironhold_world::{CreatureRegistry, CreatureTemplate, ItemCatalog, ItemType, World, WorldSettings};

    use super::*;

    #[test]
    fn yelling_is_uppercased_and_reaches_far() {
        let catalog = ItemCatalog::from_types([ItemType {
            ground: true,
            movable: false,
            ..ItemType::simple(102, "grass")
        }])
        .unwrap();
        let mut world = World::new(catalog, CreatureRegistry::default(), WorldSettings::default());
        world.add_tile(Position::new(5, 5, 7), ItemTypeId(102)).unwrap();
        let crier = world
            .spawn_creature(CreatureKind::Player, &CreatureTemplate::named("Crier"), Position::new(5, 5, 7))
            .unwrap();
        let (services, sink) = Services::buffered(4);
        let mut sim = Simulation::new(world, services);

        sim.schedule(
            Speech::new(crier, SpeechType::Yell, "hear ye").into_operation(Duration::from_secs(2)),
            Duration::ZERO,
        );
        sim.schedule(Speech::new(crier, SpeechType::Say, "   ").into_operation(Duration::from_secs(2)), Duration::ZERO);
        let records = sim.step_to(GameTime::ZERO).unwrap();
        assert_eq!(records.len(), 2);

        let speech: Vec<(Audience, Outbound)> = sink
            .drain()
            .into_iter()
            .flat_map(|note| {
                let audience = note.audience;
                note.payloads.into_iter().map(move |payload| (audience.clone(), payload))
            })
            .filter(|(_, payload)| matches!(payload, Outbound::CreatureSpeech { .. }))
            .collect();
        assert_eq!(speech.len(), 1);
        let (audience, payload) = speech.first().unwrap();
        assert!(matches!(audience, Audience::Spectators { range_x: 18, range_y: 14, .. }));
        assert!(matches!(payload, Outbound::CreatureSpeech { text, .. } if text == "HEAR YE"));
        assert_eq!(sim.handle().remaining_cooldown(crier, ExhaustionCategory::Speech), Duration::from_secs(2));
    }
}
