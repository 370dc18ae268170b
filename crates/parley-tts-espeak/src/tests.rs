//! Tests for the eSpeak backend

#[cfg(test)]
mod tests {
    use crate::{parse_voice_list, EspeakSynthesizer};
    use parley_tts::{TtsConfig, VoiceGender};

    const VOICE_LIST: &str = "\
Pty Language Age/Gender VoiceName          File          Other Languages
 5  af             M  afrikaans            other/af
 5  en             M  default              default
 2  en-gb          F  english_f            en-uk-f
 5  de             M  german               de
";

    #[test]
    fn parse_voice_list_extracts_fields() {
        let voices = parse_voice_list(VOICE_LIST);
        assert_eq!(voices.len(), 4);

        assert_eq!(voices[1].id, "default");
        assert_eq!(voices[1].language, "en");
        assert_eq!(voices[1].gender, Some(VoiceGender::Male));

        assert_eq!(voices[2].id, "english_f");
        assert_eq!(voices[2].language, "en-gb");
        assert_eq!(voices[2].gender, Some(VoiceGender::Female));
    }

    #[test]
    fn parse_voice_list_skips_header_and_garbage() {
        let voices = parse_voice_list("Pty Language Age/Gender VoiceName\nnot a voice line\n");
        assert!(voices.is_empty());
        assert!(parse_voice_list("").is_empty());
    }

    #[test]
    fn build_args_include_rate_volume_and_voice() {
        let synth = EspeakSynthesizer {
            command: "espeak".to_string(),
            config: TtsConfig {
                voice_id: None,
                rate_wpm: 150,
                volume: 0.5,
            },
            current_voice: Some("english_f".to_string()),
            available_voices: Vec::new(),
        };

        let args = synth.build_args("hello there");
        assert_eq!(
            args,
            vec!["-v", "english_f", "-s", "150", "-a", "100", "hello there"]
        );
    }

    #[test]
    fn build_args_without_voice_omits_flag() {
        let synth = EspeakSynthesizer {
            command: "espeak".to_string(),
            config: TtsConfig::default(),
            current_voice: None,
            available_voices: Vec::new(),
        };

        let args = synth.build_args("hi");
        assert!(!args.contains(&"-v".to_string()));
        // Default volume 0.8 maps to amplitude 160.
        assert!(args.windows(2).any(|w| w[0] == "-a" && w[1] == "160"));
    }

    #[test]
    fn volume_is_clamped_to_espeak_range() {
        let synth = EspeakSynthesizer {
            command: "espeak".to_string(),
            config: TtsConfig {
                voice_id: None,
                rate_wpm: 180,
                volume: 2.0,
            },
            current_voice: None,
            available_voices: Vec::new(),
        };

        let args = synth.build_args("loud");
        assert!(args.windows(2).any(|w| w[0] == "-a" && w[1] == "200"));
    }
}
