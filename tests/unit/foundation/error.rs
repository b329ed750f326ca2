use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        SplatSeqError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        SplatSeqError::sequence("x")
            .to_string()
            .contains("sequence error:")
    );
    assert!(
        SplatSeqError::manifest("x")
            .to_string()
            .contains("manifest error:")
    );
}

#[test]
fn conversion_and_encode_name_the_offender() {
    let err = SplatSeqError::conversion("scan/frame_003.ply", "exit status: 2");
    let text = err.to_string();
    assert!(text.contains("scan/frame_003.ply"));
    assert!(text.contains("exit status: 2"));

    let err = SplatSeqError::encode("shN_labels", "ffmpeg exited with status 1");
    let text = err.to_string();
    assert!(text.contains("attribute 'shN_labels'"));
    assert!(text.contains("ffmpeg exited"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = SplatSeqError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
