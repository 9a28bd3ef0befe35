//! Generation client behaviour against a mocked generateContent endpoint.

use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use playlist_studio::catalog::ImageStyle;
use playlist_studio::config::{DEFAULT_FALLBACK_IMAGE_MODEL, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
use playlist_studio::credential::CredentialStore;
use playlist_studio::image_processing::encode_png;
use playlist_studio::settings::LyricsSettings;
use playlist_studio::{AppConfig, GeminiClient, GenerationError};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn model_path(model: &str) -> String {
    format!("/v1beta/models/{model}:generateContent")
}

fn client_with(server: &MockServer, credentials: CredentialStore) -> GeminiClient {
    let config = AppConfig::with_api_base(&server.uri(), PathBuf::from("unused")).unwrap();
    GeminiClient::new(&config, Arc::new(credentials)).unwrap()
}

fn client(server: &MockServer) -> GeminiClient {
    let credentials = CredentialStore::in_memory();
    assert!(credentials.save("test-key"));
    client_with(server, credentials)
}

fn text_envelope(text: &str) -> Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
}

fn png_base64() -> String {
    let pixels = [10u8, 20, 30, 255].repeat(16 * 9);
    STANDARD.encode(encode_png(pixels, 16, 9).unwrap())
}

async fn mount_text(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path(model_path(DEFAULT_TEXT_MODEL)))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_envelope(text)))
        .mount(server)
        .await;
}

mod structured_text {
    use super::*;

    #[tokio::test]
    async fn titles_are_returned_in_order() {
        let server = MockServer::start().await;
        mount_text(&server, r#"{"titles": ["playlist 🌙 first | Night Calm", "second"]}"#).await;

        let titles = client(&server).generate_titles("Lo-fi").await.unwrap();
        assert_eq!(titles, vec!["playlist 🌙 first | Night Calm", "second"]);
    }

    #[tokio::test]
    async fn empty_titles_are_incomplete() {
        let server = MockServer::start().await;
        mount_text(&server, r#"{"titles": []}"#).await;

        let err = client(&server).generate_titles("Jazz").await.unwrap_err();
        assert!(matches!(err, GenerationError::IncompleteResult(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn json_wrapped_in_prose_is_recovered() {
        let server = MockServer::start().await;
        mount_text(
            &server,
            "Here you go:\n```json\n{\"prompts\": [\"lofi, chill, 80bpm, piano\", \"lofi, chill, 80bpm, guitar\", \"lofi, chill, 80bpm, synth\"]}\n```",
        )
        .await;

        let prompts = client(&server)
            .generate_suno_prompts("Night Walk", "Lo-fi")
            .await
            .unwrap();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[1].ends_with("guitar"));
    }

    #[tokio::test]
    async fn free_text_is_unparsable() {
        let server = MockServer::start().await;
        mount_text(&server, "Sorry, I cannot help with that.").await;

        let err = client(&server).generate_titles("Pop").await.unwrap_err();
        assert!(matches!(err, GenerationError::UnparsableResponse));
    }

    #[tokio::test]
    async fn metadata_requires_all_fields() {
        let server = MockServer::start().await;
        mount_text(&server, r##"{"description": "calm night", "hashtags": ["#playlist"]}"##).await;

        let err = client(&server)
            .generate_video_metadata("Night Walk", "Lo-fi")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::IncompleteResult(_)));
    }

    #[tokio::test]
    async fn metadata_is_parsed() {
        let server = MockServer::start().await;
        mount_text(
            &server,
            r##"{"description": "calm night", "hashtags": ["#playlist", "#lofi"], "keywords": "lofi, study"}"##,
        )
        .await;

        let metadata = client(&server)
            .generate_video_metadata("Night Walk", "Lo-fi")
            .await
            .unwrap();
        assert_eq!(metadata.hashtags[0], "#playlist");
        assert_eq!(metadata.keywords, "lofi, study");
    }

    #[tokio::test]
    async fn lyrics_request_asks_for_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(model_path(DEFAULT_TEXT_MODEL)))
            .and(body_partial_json(json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(text_envelope(r#"{"lyrics": ["[Verse 1]\nla la"]}"#)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let lyrics = client(&server)
            .generate_lyrics("Night Walk", "Lo-fi", &LyricsSettings::default())
            .await
            .unwrap();
        assert_eq!(lyrics.len(), 1);
    }

    #[tokio::test]
    async fn envelope_without_candidates_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "usageMetadata": {} })))
            .mount(&server)
            .await;

        let err = client(&server).generate_titles("Pop").await.unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse));
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn missing_credential_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_with(&server, CredentialStore::in_memory());
        let err = client.generate_titles("Pop").await.unwrap_err();
        assert!(matches!(err, GenerationError::MissingCredential));
    }

    #[tokio::test]
    async fn rejected_key_is_invalid_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": 400, "message": "API key not valid. Please pass a valid API key." }
            })))
            .mount(&server)
            .await;

        let err = client(&server).generate_titles("Pop").await.unwrap_err();
        assert!(matches!(err, GenerationError::InvalidCredential(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn server_errors_carry_endpoint_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": { "message": "The model is overloaded." }
            })))
            .mount(&server)
            .await;

        let err = client(&server).generate_titles("Pop").await.unwrap_err();
        assert_eq!(err.user_message(), "The model is overloaded.");
    }

    #[tokio::test]
    async fn error_without_body_gets_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server).generate_titles("Pop").await.unwrap_err();
        assert_eq!(err.user_message(), "The API request failed.");
    }
}

mod thumbnails {
    use super::*;

    #[tokio::test]
    async fn prompt_is_free_text() {
        let server = MockServer::start().await;
        mount_text(&server, "  A rainy window at night, neon reflections.  ").await;

        let prompt = client(&server)
            .generate_thumbnail_prompt("Night Walk", "Lo-fi", ImageStyle::default(), None, None)
            .await
            .unwrap();
        assert_eq!(prompt, "A rainy window at night, neon reflections.");
    }

    #[tokio::test]
    async fn image_request_carries_image_config() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(model_path(DEFAULT_IMAGE_MODEL)))
            .and(body_partial_json(json!({
                "generationConfig": { "imageConfig": { "aspectRatio": "16:9", "imageSize": "2K" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [
                    { "text": "here it is" },
                    { "inlineData": { "mimeType": "image/png", "data": png_base64() } }
                ] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let image = client(&server)
            .generate_thumbnail_image("a rainy window", None)
            .await
            .unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.dimensions().unwrap(), (16, 9));
    }

    #[tokio::test]
    async fn unavailable_primary_falls_back_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(model_path(DEFAULT_IMAGE_MODEL)))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "message": "models/gemini-3-pro-image-preview is not found" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(model_path(DEFAULT_FALLBACK_IMAGE_MODEL)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [
                    { "inline_data": { "mime_type": "image/png", "data": png_base64() } }
                ] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let image = client(&server)
            .generate_thumbnail_image("a rainy window", None)
            .await
            .unwrap();
        assert_eq!(image.dimensions().unwrap(), (16, 9));
    }

    #[tokio::test]
    async fn text_only_answer_is_no_image_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(model_path(DEFAULT_IMAGE_MODEL)))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(text_envelope("I can only describe it.")),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .generate_thumbnail_image("a rainy window", None)
            .await
            .unwrap_err();
        match err {
            GenerationError::NoImageData(detail) => {
                assert_eq!(detail.as_deref(), Some("I can only describe it."));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

mod self_tests {
    use super::*;

    #[tokio::test]
    async fn test_all_reports_one_of_three() {
        let server = MockServer::start().await;
        mount_text(&server, "OK").await;
        Mock::given(method("POST"))
            .and(path(model_path(DEFAULT_FALLBACK_IMAGE_MODEL)))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "Quota exceeded for image generation." }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(model_path(DEFAULT_IMAGE_MODEL)))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": { "message": "Internal error while rendering." }
            })))
            .mount(&server)
            .await;

        let report = client(&server).run_all_self_tests().await;
        assert!(!report.success);
        assert_eq!(report.success_count, 1);
        assert_eq!(report.total_count, 3);
        assert!(report.summary.contains("1/3"));
        assert!(report.results[0].success);
        assert!(!report.results[1].success);
        assert!(report.results[1].message.contains("Quota exceeded for image generation."));
        assert!(!report.results[2].success);
        assert!(report.results[2].message.contains("Internal error while rendering."));
    }

    #[tokio::test]
    async fn image_test_passes_on_text_only_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(model_path(DEFAULT_FALLBACK_IMAGE_MODEL)))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_envelope("a cat")))
            .mount(&server)
            .await;

        let result = client(&server)
            .run_self_test(playlist_studio::generation::SelfTestKind::Image)
            .await;
        assert!(result.success);
    }

    #[tokio::test]
    async fn missing_model_is_reported_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(model_path(DEFAULT_IMAGE_MODEL)))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = client(&server)
            .run_self_test(playlist_studio::generation::SelfTestKind::HighQuality)
            .await;
        assert!(!result.success);
        assert!(result.message.contains("is not available"));
    }

    #[tokio::test]
    async fn without_key_nothing_runs() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let report = client_with(&server, CredentialStore::in_memory())
            .run_all_self_tests()
            .await;
        assert!(!report.success);
        assert!(report.results.is_empty());
    }
}
