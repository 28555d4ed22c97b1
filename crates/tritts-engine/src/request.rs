use tritts_core::{PaddedReference, ReferenceVoice, SynthesisError, SynthesisRequest};

/// Number of samples the reference buffer is zero-extended to.
///
/// The target duration is estimated from the ratio of target to reference
/// text length, and the buffer covers reference plus estimated target,
/// rounded up to whole `padding_unit_secs` blocks (always at least one
/// block beyond the estimate).
pub fn padded_reference_len(
    reference: &ReferenceVoice,
    target_text: &str,
    padding_unit_secs: u32,
) -> usize {
    let duration = reference.duration_secs();
    let reference_chars = reference.text.chars().count();
    let estimated_target = if reference_chars > 0 {
        duration / reference_chars as f64 * target_text.chars().count() as f64
    } else {
        duration
    };

    let unit = padding_unit_secs.max(1) as usize;
    let blocks = (estimated_target + duration).floor() as usize / unit + 1;
    unit * reference.sample_rate as usize * blocks
}

/// Build the request for one segment.
///
/// In cache mode the server reuses a registered speaker profile, so the
/// reference is left out even when one is supplied.
pub fn build_request(
    target_text: &str,
    reference: Option<&ReferenceVoice>,
    cache_mode: bool,
    padding_unit_secs: u32,
) -> Result<SynthesisRequest, SynthesisError> {
    if target_text.trim().is_empty() {
        return Err(SynthesisError::InvalidInput(
            "target text is empty".to_string(),
        ));
    }

    let reference = match reference {
        Some(voice) if !cache_mode => Some(pad_reference(voice, target_text, padding_unit_secs)?),
        _ => None,
    };

    Ok(SynthesisRequest {
        reference,
        target_text: target_text.to_string(),
        cache_mode,
    })
}

fn pad_reference(
    voice: &ReferenceVoice,
    target_text: &str,
    padding_unit_secs: u32,
) -> Result<PaddedReference, SynthesisError> {
    if voice.channels != 1 {
        return Err(SynthesisError::InvalidInput(format!(
            "reference waveform must be single-channel, got {} channels",
            voice.channels
        )));
    }
    if voice.samples.is_empty() || voice.sample_rate == 0 {
        return Err(SynthesisError::InvalidInput(
            "reference waveform is empty".to_string(),
        ));
    }

    let padded_len = padded_reference_len(voice, target_text, padding_unit_secs)
        .max(voice.samples.len());
    let mut samples = vec![0.0f32; padded_len];
    samples[..voice.samples.len()].copy_from_slice(&voice.samples);

    Ok(PaddedReference {
        samples,
        original_len: voice.samples.len(),
        text: voice.text.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(seconds: usize, text: &str) -> ReferenceVoice {
        ReferenceVoice {
            samples: vec![0.5; seconds * 16000],
            channels: 1,
            sample_rate: 16000,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_padded_len_uses_text_ratio() {
        // 4s reference, target twice as long as reference text → ~8s estimate
        // floor(8 + 4) / 10 + 1 = 2 blocks of 10s
        let reference = voice(4, "abcde");
        assert_eq!(padded_reference_len(&reference, "abcdefghij", 10), 2 * 10 * 16000);
    }

    #[test]
    fn test_padded_len_falls_back_without_reference_text() {
        // estimate = 3s, floor(3 + 3) / 10 + 1 = 1 block
        let reference = voice(3, "");
        assert_eq!(padded_reference_len(&reference, "anything at all", 10), 10 * 16000);
    }

    #[test]
    fn test_build_with_reference_pads_with_zeros() {
        let reference = voice(2, "ref text");
        let request = build_request("target", Some(&reference), false, 10).unwrap();
        let padded = request.reference.unwrap();
        assert_eq!(padded.original_len, 32000);
        assert_eq!(padded.samples.len(), 10 * 16000);
        assert!(padded.samples[..32000].iter().all(|&s| s == 0.5));
        assert!(padded.samples[32000..].iter().all(|&s| s == 0.0));
        assert_eq!(padded.text, "ref text");
        assert_eq!(request.target_text, "target");
        assert!(!request.cache_mode);
    }

    #[test]
    fn test_cache_mode_omits_reference() {
        let reference = voice(2, "ref text");
        let request = build_request("target", Some(&reference), true, 10).unwrap();
        assert!(request.reference.is_none());
        assert!(request.cache_mode);
    }

    #[test]
    fn test_no_reference_sends_target_only() {
        let request = build_request("target", None, false, 10).unwrap();
        assert!(request.reference.is_none());
    }

    #[test]
    fn test_multichannel_reference_is_invalid() {
        let mut reference = voice(1, "ref");
        reference.channels = 2;
        match build_request("target", Some(&reference), false, 10) {
            Err(SynthesisError::InvalidInput(msg)) => assert!(msg.contains("single-channel")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_multichannel_reference_ignored_in_cache_mode() {
        let mut reference = voice(1, "ref");
        reference.channels = 2;
        assert!(build_request("target", Some(&reference), true, 10).is_ok());
    }

    #[test]
    fn test_blank_target_is_invalid() {
        assert!(matches!(
            build_request("   ", None, true, 10),
            Err(SynthesisError::InvalidInput(_))
        ));
    }
}
