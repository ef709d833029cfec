use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::*;
use crate::config::ControlsSettings;
use crate::library::{Track, TrackId};
use crate::session::Session;
use crate::store::{KvStore, keys};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Bind(BindingId, PathBuf),
    Unbind,
    Play(PlayToken),
    Pause,
    SetPosition(f64),
    Volume(f64),
}

#[derive(Default)]
struct FakeMedia {
    calls: Vec<Call>,
    position: f64,
    volume: f64,
}

impl FakeMedia {
    fn last_binding(&self) -> BindingId {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                Call::Bind(b, _) => Some(*b),
                _ => None,
            })
            .unwrap()
    }

    fn last_play(&self) -> PlayToken {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                Call::Play(t) => Some(*t),
                _ => None,
            })
            .unwrap()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl MediaElement for FakeMedia {
    fn bind(&mut self, binding: BindingId, source: &Path) {
        self.position = 0.0;
        self.calls.push(Call::Bind(binding, source.to_path_buf()));
    }

    fn unbind(&mut self) {
        self.calls.push(Call::Unbind);
    }

    fn play(&mut self, token: PlayToken) {
        self.calls.push(Call::Play(token));
    }

    fn pause(&mut self) {
        self.calls.push(Call::Pause);
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn set_position(&mut self, seconds: f64) {
        self.position = seconds;
        self.calls.push(Call::SetPosition(seconds));
    }

    fn set_volume(&mut self, level: f64) {
        self.volume = level;
        self.calls.push(Call::Volume(level));
    }
}

fn catalog(n: usize) -> Vec<Track> {
    (0..n)
        .map(|i| Track {
            id: TrackId::new(format!("t{i}")),
            title: format!("Track {i}"),
            artist: "Artist".into(),
            cover: None,
            source: PathBuf::from(format!("/music/t{i}.mp3")),
        })
        .collect()
}

fn setup_with(n: usize, prefs: PlayerPrefs) -> (PlaybackCore, Session, FakeMedia) {
    let session = Session::new(catalog(n));
    let mut core = PlaybackCore::new(prefs, &ControlsSettings::default());
    core.set_track_list((0..n).collect());
    let mut media = FakeMedia::default();
    core.attach(&mut media);
    core.sync(&session, &mut media);
    (core, session, media)
}

fn setup(n: usize) -> (PlaybackCore, Session, FakeMedia) {
    setup_with(n, PlayerPrefs::default())
}

fn select(core: &mut PlaybackCore, session: &mut Session, media: &mut FakeMedia, index: usize) {
    session.set_current_index(index);
    core.sync(session, media);
}

fn set_repeat(core: &mut PlaybackCore, mode: RepeatMode) {
    while core.repeat() != mode {
        core.cycle_repeat();
    }
}

#[test]
fn advance_on_single_track_without_repeat_stops_in_place() {
    let (mut core, mut session, mut media) = setup(1);
    core.set_playing(true, &mut media);

    core.advance(&mut session, &mut media);

    assert!(!core.is_playing());
    assert_eq!(session.current_index(), Some(0));
    assert_eq!(media.calls.last(), Some(&Call::Pause));
}

#[test]
fn advance_with_repeat_all_wraps_to_first_track() {
    let (mut core, mut session, mut media) = setup(3);
    set_repeat(&mut core, RepeatMode::All);
    select(&mut core, &mut session, &mut media, 2);

    core.advance(&mut session, &mut media);

    assert_eq!(session.current_index(), Some(0));
    assert!(core.is_playing());
    assert_eq!(core.bound_index(), Some(0));
    let binding = media.last_binding();
    assert_eq!(media.last_play().binding, binding);
    assert!(media
        .calls
        .contains(&Call::Bind(binding, PathBuf::from("/music/t0.mp3"))));
}

#[test]
fn advance_with_repeat_one_restarts_without_changing_index() {
    for shuffle in [false, true] {
        let (mut core, mut session, mut media) = setup(4);
        if shuffle {
            core.toggle_shuffle();
        }
        set_repeat(&mut core, RepeatMode::One);
        select(&mut core, &mut session, &mut media, 2);
        let binding = media.last_binding();
        media.position = 42.0;

        for _ in 0..5 {
            core.advance(&mut session, &mut media);
            assert_eq!(session.current_index(), Some(2));
            assert_eq!(media.position, 0.0);
            assert_eq!(core.transport().progress, 0.0);
            assert!(core.is_playing());
        }
        assert_eq!(media.last_binding(), binding);
        assert_eq!(media.last_play().binding, binding);
    }
}

#[test]
fn retreat_restarts_past_threshold_otherwise_steps_back_with_wrap() {
    let (mut core, mut session, mut media) = setup(3);
    select(&mut core, &mut session, &mut media, 1);

    media.position = 5.0;
    core.retreat(&mut session, &mut media);
    assert_eq!(session.current_index(), Some(1));
    assert_eq!(media.position, 0.0);
    assert!(!core.is_playing());

    media.position = 1.0;
    core.retreat(&mut session, &mut media);
    assert_eq!(session.current_index(), Some(0));
    assert!(core.is_playing());

    core.retreat(&mut session, &mut media);
    assert_eq!(session.current_index(), Some(2));
}

#[test]
fn shuffle_never_repeats_the_current_index() {
    let (mut core, mut session, mut media) = setup(5);
    core.toggle_shuffle();

    for round in 0..200 {
        let before = session.current_index().unwrap();
        if round % 2 == 0 {
            core.advance(&mut session, &mut media);
        } else {
            core.retreat(&mut session, &mut media);
        }
        let after = session.current_index().unwrap();
        assert!(after < 5);
        assert_ne!(after, before);
        assert!(core.is_playing());
    }
}

#[test]
fn shuffle_on_single_track_is_a_no_op() {
    let (mut core, mut session, mut media) = setup(1);
    core.toggle_shuffle();
    let calls_before = media.calls.len();

    core.advance(&mut session, &mut media);
    core.retreat(&mut session, &mut media);

    assert_eq!(session.current_index(), Some(0));
    assert_eq!(media.calls.len(), calls_before);
    assert!(!core.is_playing());
}

#[test]
fn seek_clamps_to_known_duration() {
    let (mut core, mut session, mut media) = setup(1);
    let binding = media.last_binding();
    core.handle_media_event(
        MediaEvent::MetadataReady {
            binding,
            duration: 180.0,
        },
        &mut session,
        &mut media,
    );

    core.seek(200.0, &mut media);
    assert_eq!(core.transport().progress, 180.0);
    assert_eq!(media.position, 180.0);

    core.seek(-5.0, &mut media);
    assert_eq!(core.transport().progress, 0.0);
    assert_eq!(media.position, 0.0);

    core.seek_to_fraction(0.5, &mut media);
    assert_eq!(core.transport().progress, 90.0);
}

#[test]
fn seek_with_unknown_duration_is_a_no_op() {
    let (mut core, _session, mut media) = setup(1);
    let calls_before = media.calls.len();

    core.seek(50.0, &mut media);

    assert_eq!(core.transport().progress, 0.0);
    assert_eq!(media.calls.len(), calls_before);
}

#[test]
fn volume_shortcuts_step_by_five_hundredths_and_clamp() {
    let prefs = PlayerPrefs {
        volume: 0.5,
        ..PlayerPrefs::default()
    };
    let (mut core, mut session, mut media) = setup_with(1, prefs);

    for _ in 0..5 {
        core.dispatch(Shortcut::VolumeUp, &mut session, &mut media);
    }
    assert_eq!(core.transport().volume, 0.75);

    for _ in 0..10 {
        core.dispatch(Shortcut::VolumeUp, &mut session, &mut media);
    }
    assert_eq!(core.transport().volume, 1.0);

    for _ in 0..30 {
        core.dispatch(Shortcut::VolumeDown, &mut session, &mut media);
    }
    assert_eq!(core.transport().volume, 0.0);
    assert_eq!(media.volume, 0.0);
}

#[test]
fn mute_and_volume_are_independent() {
    let (mut core, _session, mut media) = setup(1);
    core.set_volume(0.6, &mut media);

    core.toggle_mute(&mut media);
    assert_eq!(media.volume, 0.0);
    assert_eq!(core.transport().volume, 0.6);

    core.set_volume(0.3, &mut media);
    assert!(core.transport().muted);
    assert_eq!(media.volume, 0.0);

    core.toggle_mute(&mut media);
    assert_eq!(media.volume, 0.3);
    assert_eq!(core.effective_volume(), 0.3);
}

#[test]
fn track_change_rebinds_and_plays_only_when_playing_before() {
    let (mut core, mut session, mut media) = setup(3);
    let first = media.last_binding();

    select(&mut core, &mut session, &mut media, 1);
    let second = media.last_binding();
    assert_ne!(first, second);
    assert_eq!(media.count(|c| matches!(c, Call::Play(_))), 0);

    core.set_playing(true, &mut media);
    core.handle_media_event(
        MediaEvent::MetadataReady {
            binding: second,
            duration: 200.0,
        },
        &mut session,
        &mut media,
    );
    core.handle_media_event(
        MediaEvent::PositionChanged {
            binding: second,
            position: 12.5,
        },
        &mut session,
        &mut media,
    );
    assert_eq!(core.transport().progress, 12.5);

    let calls_before = media.calls.len();
    select(&mut core, &mut session, &mut media, 2);
    let third = media.last_binding();
    let protocol = &media.calls[calls_before..];
    assert_eq!(
        protocol,
        &[
            Call::Pause,
            Call::SetPosition(0.0),
            Call::Bind(third, PathBuf::from("/music/t2.mp3")),
            Call::Play(media.last_play()),
        ]
    );
    assert_eq!(core.transport().progress, 0.0);
    assert_eq!(core.transport().duration, 0.0);
}

#[test]
fn failed_play_reverts_intent_but_stale_failures_are_ignored() {
    let (mut core, mut session, mut media) = setup(2);

    core.set_playing(true, &mut media);
    let token = media.last_play();
    core.handle_media_event(
        MediaEvent::PlayFailed {
            token,
            reason: "blocked".into(),
        },
        &mut session,
        &mut media,
    );
    assert!(!core.is_playing());

    core.set_playing(true, &mut media);
    let stale = media.last_play();
    select(&mut core, &mut session, &mut media, 1);
    assert_ne!(media.last_play(), stale);
    core.handle_media_event(
        MediaEvent::PlayFailed {
            token: stale,
            reason: "late".into(),
        },
        &mut session,
        &mut media,
    );
    assert!(core.is_playing());
}

#[test]
fn late_play_success_after_pause_pauses_the_element_again() {
    let (mut core, mut session, mut media) = setup(1);
    core.set_playing(true, &mut media);
    let token = media.last_play();
    core.set_playing(false, &mut media);
    let pauses = media.count(|c| *c == Call::Pause);

    core.handle_media_event(MediaEvent::PlayStarted { token }, &mut session, &mut media);

    assert!(!core.is_playing());
    assert_eq!(media.count(|c| *c == Call::Pause), pauses + 1);
}

#[test]
fn events_from_a_previous_binding_are_ignored() {
    let (mut core, mut session, mut media) = setup(3);
    let old = media.last_binding();
    select(&mut core, &mut session, &mut media, 1);

    core.handle_media_event(
        MediaEvent::PositionChanged {
            binding: old,
            position: 30.0,
        },
        &mut session,
        &mut media,
    );
    core.handle_media_event(
        MediaEvent::MetadataReady {
            binding: old,
            duration: 100.0,
        },
        &mut session,
        &mut media,
    );
    core.handle_media_event(MediaEvent::Ended { binding: old }, &mut session, &mut media);

    assert_eq!(core.transport().progress, 0.0);
    assert_eq!(core.transport().duration, 0.0);
    assert_eq!(session.current_index(), Some(1));
}

#[test]
fn invalid_durations_keep_the_last_good_value() {
    let (mut core, mut session, mut media) = setup(1);
    let binding = media.last_binding();

    for (reported, expected) in [(f64::NAN, 0.0), (120.0, 120.0), (f64::INFINITY, 120.0)] {
        core.handle_media_event(
            MediaEvent::MetadataReady {
                binding,
                duration: reported,
            },
            &mut session,
            &mut media,
        );
        assert_eq!(core.transport().duration, expected);
    }
}

#[test]
fn natural_end_advances_and_stops_after_the_last_track() {
    let (mut core, mut session, mut media) = setup(2);
    core.set_playing(true, &mut media);

    let binding = media.last_binding();
    core.handle_media_event(MediaEvent::Ended { binding }, &mut session, &mut media);
    assert_eq!(session.current_index(), Some(1));
    assert!(core.is_playing());

    let binding = media.last_binding();
    core.handle_media_event(MediaEvent::Ended { binding }, &mut session, &mut media);
    assert_eq!(session.current_index(), Some(1));
    assert!(!core.is_playing());
}

#[test]
fn repeat_all_on_a_single_track_replays_it() {
    let (mut core, mut session, mut media) = setup(1);
    set_repeat(&mut core, RepeatMode::All);
    core.set_playing(true, &mut media);
    media.position = 200.0;
    let plays = media.count(|c| matches!(c, Call::Play(_)));

    core.advance(&mut session, &mut media);

    assert_eq!(session.current_index(), Some(0));
    assert_eq!(media.position, 0.0);
    assert_eq!(media.count(|c| matches!(c, Call::Play(_))), plays + 1);
}

#[test]
fn sequential_moves_follow_the_bound_queue_not_the_catalog() {
    let (mut core, mut session, mut media) = setup(5);
    core.set_track_list(vec![0, 2, 4]);

    select(&mut core, &mut session, &mut media, 2);
    core.advance(&mut session, &mut media);
    assert_eq!(session.current_index(), Some(4));

    core.advance(&mut session, &mut media);
    assert_eq!(session.current_index(), Some(4));
    assert!(!core.is_playing());

    // Current track outside the queue: next is the first entry, previous the last.
    select(&mut core, &mut session, &mut media, 1);
    core.advance(&mut session, &mut media);
    assert_eq!(session.current_index(), Some(0));

    select(&mut core, &mut session, &mut media, 3);
    core.retreat(&mut session, &mut media);
    assert_eq!(session.current_index(), Some(4));
}

#[test]
fn keyboard_seek_uses_a_large_bound_while_duration_is_unknown() {
    let (mut core, mut session, mut media) = setup(1);
    media.position = 10.0;

    core.dispatch(Shortcut::SeekForward, &mut session, &mut media);
    assert_eq!(media.position, 15.0);
    assert_eq!(core.transport().progress, 15.0);

    for _ in 0..4 {
        core.dispatch(Shortcut::SeekBackward, &mut session, &mut media);
    }
    assert_eq!(media.position, 0.0);
}

#[test]
fn empty_catalog_never_starts_playback() {
    let (mut core, mut session, mut media) = setup(0);

    core.dispatch(Shortcut::TogglePlay, &mut session, &mut media);
    core.dispatch(Shortcut::Next, &mut session, &mut media);
    core.dispatch(Shortcut::Previous, &mut session, &mut media);

    assert!(!core.is_playing());
    assert_eq!(core.bound_index(), None);
    assert_eq!(media.count(|c| matches!(c, Call::Bind(..) | Call::Play(_))), 0);
}

#[test]
fn preference_changes_are_flagged_and_persist() {
    let (mut core, _session, _media) = setup(1);
    assert!(!core.take_prefs_dirty());

    core.toggle_shuffle();
    core.cycle_repeat();
    assert_eq!(core.repeat(), RepeatMode::All);
    assert!(core.take_prefs_dirty());
    assert!(!core.take_prefs_dirty());

    let mut kv = KvStore::in_memory();
    core.prefs().save(&mut kv).unwrap();
    assert_eq!(kv.get(keys::REPEAT, String::new()), "all");
    assert_eq!(PlayerPrefs::load(&kv), core.prefs());
}

#[test]
fn repeat_mode_cycles_none_all_one() {
    assert_eq!(RepeatMode::None.cycled(), RepeatMode::All);
    assert_eq!(RepeatMode::All.cycled(), RepeatMode::One);
    assert_eq!(RepeatMode::One.cycled(), RepeatMode::None);
}

#[test]
fn shortcuts_map_keys_and_are_suspended_while_typing() {
    let key = |code| KeyEvent::new(code, KeyModifiers::NONE);

    assert_eq!(shortcut_for(&key(KeyCode::Char(' ')), false), Some(Shortcut::TogglePlay));
    assert_eq!(shortcut_for(&key(KeyCode::Right), false), Some(Shortcut::SeekForward));
    assert_eq!(shortcut_for(&key(KeyCode::Left), false), Some(Shortcut::SeekBackward));
    assert_eq!(shortcut_for(&key(KeyCode::Up), false), Some(Shortcut::VolumeUp));
    assert_eq!(shortcut_for(&key(KeyCode::Down), false), Some(Shortcut::VolumeDown));
    assert_eq!(shortcut_for(&key(KeyCode::Char('N')), false), Some(Shortcut::Next));
    assert_eq!(shortcut_for(&key(KeyCode::Char('p')), false), Some(Shortcut::Previous));
    assert_eq!(shortcut_for(&key(KeyCode::Char('x')), false), None);

    assert_eq!(shortcut_for(&key(KeyCode::Char(' ')), true), None);
    assert_eq!(
        shortcut_for(&KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL), false),
        None
    );
}
