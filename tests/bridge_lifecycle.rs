use serde_json::json;

use yt_player_bridge::codec::{BridgeMessage, decode_notification};
use yt_player_bridge::testing::{DelegateEvent, RecordingDelegate, RecordingFactory};
use yt_player_bridge::{
    LoadError, LoadRequest, NavigationPolicy, PlaybackQuality, PlayerBridge, PlayerError, PlayerState,
    PlayerVars, PlaylistSource, ReadinessState, StatusBoard,
};

fn loaded_bridge() -> (PlayerBridge<RecordingFactory>, RecordingFactory, RecordingDelegate) {
    let factory = RecordingFactory::new();
    let delegate = RecordingDelegate::new();
    let mut bridge = PlayerBridge::new(factory.clone());
    bridge.set_delegate(delegate.clone());
    bridge.load_player_with_video_id("M7lc1UVf-VE", None).unwrap();
    (bridge, factory, delegate)
}

fn notify(bridge: &mut PlayerBridge<RecordingFactory>, url: &str) -> NavigationPolicy {
    let token = bridge.surface_token().expect("surface is attached");
    bridge.handle_navigation(token, url)
}

#[test]
fn valid_load_is_loading_synchronously_and_ready_only_after_on_ready() {
    let (mut bridge, factory, delegate) = loaded_bridge();
    assert_eq!(bridge.readiness(), ReadinessState::Loading);
    assert_eq!(factory.log().created.len(), 1);

    notify(&mut bridge, "ytplayer://onPlaybackQualityChange?data=3");
    notify(&mut bridge, "ytplayer://onPlayTime?data=0.5");
    assert_eq!(bridge.readiness(), ReadinessState::Loading);

    assert_eq!(notify(&mut bridge, "ytplayer://onReady"), NavigationPolicy::Cancel);
    assert_eq!(bridge.readiness(), ReadinessState::Ready);
    assert_eq!(
        delegate.player_events().last(),
        Some(&DelegateEvent::Ready)
    );
}

#[test]
fn gated_commands_never_reach_the_surface_before_ready() {
    let (mut bridge, factory, _delegate) = loaded_bridge();
    assert!(bridge.play_video().is_err());
    assert!(bridge.pause_video().is_err());
    assert!(bridge.stop_video().is_err());
    assert!(bridge.seek_to(30.0, false).is_err());
    assert!(bridge.load_video_by_id("abc", 0.0, None, PlaybackQuality::Default).is_err());
    assert!(bridge.next_video().is_err());
    assert!(bridge.set_playback_rate(2.0).is_err());
    assert!(factory.scripts().is_empty());

    notify(&mut bridge, "ytplayer://onReady");
    bridge.seek_to(30.0, false).unwrap();
    assert_eq!(factory.commands(), vec![("seekTo".to_string(), vec![json!(30.0), json!(false)])]);
}

#[test]
fn state_and_error_codes_decode_with_fallbacks() {
    let (mut bridge, _factory, delegate) = loaded_bridge();
    notify(&mut bridge, "ytplayer://onReady");
    delegate.clear();

    notify(&mut bridge, "ytplayer://onStateChange?data=2");
    assert_eq!(bridge.player_state(), PlayerState::Playing);
    notify(&mut bridge, "ytplayer://onStateChange?data=99");
    assert_eq!(bridge.player_state(), PlayerState::Unknown);

    for code in ["100", "105", "101", "150", "999"] {
        notify(&mut bridge, &format!("ytplayer://onError?data={}", code));
    }
    assert_eq!(
        delegate.player_events(),
        vec![
            DelegateEvent::StateChanged(PlayerState::Playing),
            DelegateEvent::StateChanged(PlayerState::Unknown),
            DelegateEvent::Error(PlayerError::VideoNotFound),
            DelegateEvent::Error(PlayerError::VideoNotFound),
            DelegateEvent::Error(PlayerError::NotEmbeddable),
            DelegateEvent::Error(PlayerError::NotEmbeddable),
            DelegateEvent::Error(PlayerError::Unknown),
        ]
    );
}

#[test]
fn video_and_playlist_together_fail_without_loading() {
    let factory = RecordingFactory::new();
    let mut bridge = PlayerBridge::new(factory.clone());
    let mut vars = PlayerVars::new();
    vars.insert("list".to_string(), json!("PLhBgTdAWkxeCMHYCQ0uuLyhydRJGDRNo5"));

    let result = bridge.load_player_with_video_id("M7lc1UVf-VE", Some(vars));
    assert!(matches!(result, Err(LoadError::ConflictingSources)));
    assert_eq!(bridge.readiness(), ReadinessState::NotLoaded);
    assert!(factory.log().documents.is_empty());
}

#[test]
fn hostile_strings_reach_the_player_unchanged() {
    let (mut bridge, factory, _delegate) = loaded_bridge();
    notify(&mut bridge, "ytplayer://onReady");

    let hostile = "a\"b'c\\d\ne\u{2028}f</script>g\u{1F3B5}";
    bridge.cue_video_by_id(hostile, 0.0, None, PlaybackQuality::Small).unwrap();
    bridge
        .load_playlist(
            PlaylistSource::VideoIds(vec![hostile.to_string(), "plain".to_string()]),
            1,
            5.0,
            PlaybackQuality::Default,
        )
        .unwrap();

    let commands = factory.commands();
    assert_eq!(commands[0].0, "cueVideoById");
    assert_eq!(commands[0].1[0]["videoId"], json!(hostile));
    assert_eq!(commands[1].0, "loadPlaylist");
    assert_eq!(commands[1].1[0], json!([hostile, "plain"]));
    for script in factory.scripts() {
        assert!(!script.contains("</script>"));
        assert!(!script.contains('\u{2028}'));
    }
}

#[test]
fn teardown_makes_late_notifications_inert() {
    let (mut bridge, factory, delegate) = loaded_bridge();
    let token = bridge.surface_token().unwrap();
    notify(&mut bridge, "ytplayer://onReady");
    notify(&mut bridge, "ytplayer://onPlayTime?data=12.5");

    bridge.teardown();
    delegate.clear();
    let before = bridge.snapshot();

    assert_eq!(
        bridge.handle_navigation(token, "ytplayer://onPlayTime?data=99"),
        NavigationPolicy::Cancel
    );
    bridge.handle_navigation(token, "ytplayer://onPlaybackQualityChange?data=5");
    bridge.handle_navigation(token, "https://example.com/elsewhere");

    assert_eq!(bridge.snapshot(), before);
    assert!(delegate.events().is_empty());
    assert!(factory.log().opened_externally.is_empty());
}

#[test]
fn snapshot_serializes_in_camel_case() {
    let (mut bridge, _factory, _delegate) = loaded_bridge();
    notify(&mut bridge, "ytplayer://onReady");
    notify(&mut bridge, "ytplayer://onPlaybackRateChange?data=0.5");

    let value = serde_json::to_value(bridge.snapshot()).unwrap();
    assert_eq!(value["readiness"], json!("ready"));
    assert_eq!(value["playbackRate"], json!(0.5));
    assert_eq!(value["currentTime"], json!(0.0));
    assert_eq!(value["playlistIndex"], json!(null));
}

#[test]
fn status_board_tracks_the_demo_display() {
    let factory = RecordingFactory::new();
    let board = StatusBoard::new();
    let mut bridge = PlayerBridge::new(factory);
    bridge.set_delegate(board.clone());
    bridge.load_player(LoadRequest::playlist("PLhBgTdAWkxeCMHYCQ0uuLyhydRJGDRNo5")).unwrap();

    notify(&mut bridge, "ytplayer://onReady");
    notify(&mut bridge, "ytplayer://onStateChange?data=4");
    notify(&mut bridge, "ytplayer://onPlayTime?data=3.25");

    let status = board.snapshot();
    assert!(status.ready);
    assert_eq!(status.state, Some(PlayerState::Buffering));
    assert_eq!(status.play_time, Some(3.25));
    assert!(!status.load_failed);
}

#[test]
fn decoder_is_usable_on_its_own() {
    assert_eq!(
        decode_notification("ytplayer://onVideoData?duration=212.5&playlist=&playlistIndex=-1")
            .map(|message| matches!(message, BridgeMessage::VideoData(_))),
        Ok(true)
    );
    assert_eq!(
        decode_notification("ytplayer://onSomethingNew?data=1"),
        Ok(BridgeMessage::Unrecognized {
            event: "onSomethingNew".to_string(),
            data: Some("1".to_string()),
        })
    );
    assert!(decode_notification("https://example.com/?data=1").is_err());
}
