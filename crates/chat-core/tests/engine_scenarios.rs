//! Engine scenario tests
//!
//! Whole-engine behaviour through the public API: who reacts to a message,
//! what happens to replies when their author leaves, and the join/leave cycle.

use chat_core::config::LifecycleConfig;
use chat_core::systems::join_probability;
use chat_core::{ChatEngine, EngineConfig, EngineError, MessageTemplates, RecordingSink, Task};
use chat_events::{ChatEvent, MessageDraft, MessageKind, ParticipantId, SimTime};

/// No joins, no idle chatter, and a bother level that is exactly the bot's
/// talkativeness.
fn scripted_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.session.initial_bots = 0;
    config.lifecycle.join_base_probability = 0.0;
    config.lifecycle.join_floor_probability = 0.0;
    config.reaction.random_weight = 0.0;
    config.reaction.relationship_weight = 0.0;
    config.reaction.talkativeness_weight = 1.0;
    config.reaction.bother_threshold = 0.5;
    config
}

fn engine_with(config: EngineConfig) -> (ChatEngine, RecordingSink) {
    let recorder = RecordingSink::new();
    let engine = ChatEngine::new(config, MessageTemplates::default(), 42, recorder.clone()).unwrap();
    (engine, recorder)
}

/// Human plus three bots with fixed verbosity: bother 0.6, 0.8 and 0.2.
fn room_of_three() -> (ChatEngine, RecordingSink, [ParticipantId; 3]) {
    let (mut engine, recorder) = engine_with(scripted_config());
    engine.add_human().unwrap();
    let bots = [engine.add_bot(), engine.add_bot(), engine.add_bot()];
    for (bot, verbosity) in bots.iter().zip([0.4, 0.2, 0.8]) {
        engine
            .registry_mut()
            .get_mut(*bot)
            .unwrap()
            .bot_mut()
            .unwrap()
            .verbosity = verbosity;
    }
    (engine, recorder, bots)
}

fn is_busy(engine: &ChatEngine, bot: ParticipantId) -> bool {
    engine.participant(bot).unwrap().bot().unwrap().busy
}

#[test]
fn test_most_bothered_bots_reply_in_order() {
    let (mut engine, _, [a, b, c]) = room_of_three();
    engine.submit_human_message("hello everyone").unwrap();

    let pending = engine.pending_deliveries();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].from.id, b);
    assert_eq!(pending[1].from.id, a);
    for draft in &pending {
        // Plain human chatter is answered with a greeting to the human
        assert_eq!(draft.kind, MessageKind::Greeting);
        assert_eq!(draft.to.as_ref().map(|t| t.name.as_str()), Some("You"));
    }
    assert!(is_busy(&engine, a) && is_busy(&engine, b));
    assert!(!is_busy(&engine, c));
    assert_eq!(engine.stats().reactions_scheduled, 2);
}

#[test]
fn test_busy_bots_do_not_react_again() {
    let (mut engine, _, [_, _, c]) = room_of_three();
    engine.submit_human_message("hello everyone").unwrap();
    engine
        .registry_mut()
        .get_mut(c)
        .unwrap()
        .bot_mut()
        .unwrap()
        .verbosity = 0.1;

    engine.submit_human_message("anyone?").unwrap();
    let pending = engine.pending_deliveries();
    assert_eq!(pending.len(), 3);
    assert_eq!(pending[2].from.id, c);
}

#[test]
fn test_reply_of_departed_bot_is_dropped() {
    let (mut engine, recorder, [a, b, _]) = room_of_three();
    engine.submit_human_message("hello everyone").unwrap();
    engine.remove_participant(b).unwrap();

    engine.advance_by(60_000);
    let messages = recorder.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].from.id, a);
    assert!(messages.iter().all(|m| m.from.id != b));
    assert_eq!(engine.stats().stale_deliveries, 1);
    assert!(engine.pending_deliveries().is_empty());

    // The surviving replier is free again and has greeted
    let state = engine.participant(a).unwrap().bot().unwrap();
    assert!(!state.busy);
    assert!(state.has_greeted);
}

#[test]
fn test_draft_naming_departed_subject_is_dropped() {
    let (mut engine, recorder, [a, b, c]) = room_of_three();
    let reference = |engine: &ChatEngine, id| engine.participant_ref(id).unwrap();
    let draft = MessageDraft {
        from: reference(&engine, a),
        to: Some(reference(&engine, b)),
        kind: MessageKind::Gossip,
        about: Some(reference(&engine, c)),
        mood: 0.5,
        text: "did you hear?".to_string(),
    };
    engine.remove_participant(c).unwrap();
    assert!(engine.post(draft).is_none());
    assert!(recorder.messages().is_empty());
}

#[test]
fn test_removal_leaves_no_dangling_ids() {
    let (mut engine, recorder, [a, b, c]) = room_of_three();
    engine.remove_participant(b).unwrap();

    assert!(engine.participant(b).is_none());
    for participant in engine.registry().participants() {
        assert!(participant.relationship(b).is_none());
    }
    assert!(engine.participant(a).unwrap().relationship(c).is_some());
    assert!(recorder.announcements().iter().any(|t| t.ends_with("left the chat")));
    assert!(matches!(
        engine.remove_participant(b),
        Err(EngineError::UnknownParticipant(_))
    ));
}

#[test]
fn test_addressed_warm_message_moves_score() {
    let (mut engine, _, [a, b, c]) = room_of_three();
    let draft = MessageDraft {
        from: engine.participant_ref(a).unwrap(),
        to: Some(engine.participant_ref(b).unwrap()),
        kind: MessageKind::Greeting,
        about: None,
        mood: 0.9,
        text: "Hi there, friend!".to_string(),
    };
    engine.post(draft).unwrap();

    let addressed = engine.participant(b).unwrap().relationship(a).unwrap().score_or_neutral();
    let bystander = engine.participant(c).unwrap().relationship(a).unwrap().score_or_neutral();
    assert!((addressed - 60.0).abs() < 1e-3, "addressed score {}", addressed);
    assert!((bystander - 40.0).abs() < 1e-3, "bystander score {}", bystander);

    // The human never scores anyone
    let human = engine.registry().human().unwrap();
    assert_eq!(human.relationship(a).unwrap().score, None);
}

#[test]
fn test_human_mention_is_addressed() {
    let (mut engine, _, [_, _, c]) = room_of_three();
    let name = engine.participant(c).unwrap().name().to_string();
    let message = engine
        .submit_human_message(&format!("@{} what do you think?", name))
        .unwrap();
    assert_eq!(message.to.map(|t| t.id), Some(c));
    assert_eq!(message.mood, 0.5);
}

#[test]
fn test_human_input_errors() {
    let (mut engine, _, _) = room_of_three();
    assert!(matches!(engine.submit_human_message(" \t "), Err(EngineError::EmptyMessage)));
    assert!(matches!(engine.add_human(), Err(EngineError::HumanAlreadyPresent(_))));
}

#[test]
fn test_join_curve_falls_as_room_fills() {
    let config = LifecycleConfig::default();
    let curve: Vec<f32> = (0..=config.room_full).map(|n| join_probability(n, &config)).collect();
    assert!((curve[0] - config.join_base_probability).abs() < 1e-6);
    assert!((curve[config.room_full] - config.join_floor_probability).abs() < 1e-6);
    for pair in curve.windows(2) {
        assert!(pair[1] <= pair[0]);
    }
}

#[test]
fn test_unhappy_bots_say_goodbye_and_leave() {
    let mut config = EngineConfig::default();
    config.session.initial_bots = 3;
    config.lifecycle.join_base_probability = 0.0;
    config.lifecycle.join_floor_probability = 0.0;
    config.lifecycle.leave_rate = 1.0;
    config.lifecycle.goodbye_probability = 1.0;
    config.reaction.bother_threshold = 10.0;
    config.initiative.eagerness_threshold = 1.0;
    let (mut engine, recorder) = engine_with(config);

    engine.start();
    assert_eq!(engine.registry().bot_count(), 3);
    engine.advance_to(SimTime::from_secs(120));

    assert_eq!(engine.registry().bot_count(), 0);
    assert_eq!(engine.stats().leaves, 3);
    assert_eq!(engine.stats().posts_of(MessageKind::Goodbye), 3);

    let events = recorder.events();
    for (index, event) in events.iter().enumerate() {
        if let ChatEvent::ParticipantLeft { participant, .. } = event {
            let said_goodbye = events[..index].iter().any(|e| {
                e.message()
                    .is_some_and(|m| m.from.id == participant.id && m.kind == MessageKind::Goodbye)
            });
            assert!(said_goodbye, "{} left without a goodbye", participant.name);
        }
    }
}

#[test]
fn test_busy_bots_are_not_rolled_twice_for_leaving() {
    let mut config = EngineConfig::default();
    config.session.initial_bots = 2;
    config.lifecycle.join_base_probability = 0.0;
    config.lifecycle.join_floor_probability = 0.0;
    config.lifecycle.leave_rate = 1.0;
    config.lifecycle.goodbye_probability = 0.0;
    config.lifecycle.departure_delay_min_ms = 10_000;
    config.lifecycle.departure_delay_max_ms = 10_000;
    config.reaction.bother_threshold = 10.0;
    config.initiative.eagerness_threshold = 1.0;
    let (mut engine, _) = engine_with(config);

    engine.start();
    engine.advance_to(SimTime::from_secs(5));
    let departures = engine
        .timers()
        .pending()
        .into_iter()
        .filter(|s| matches!(s.task, Task::Depart { .. }))
        .count();
    assert_eq!(departures, 2);

    engine.advance_to(SimTime::from_secs(60));
    assert_eq!(engine.stats().leaves, 2);
    assert_eq!(engine.registry().bot_count(), 0);
}
