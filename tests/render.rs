use proptest::prelude::*;
use serde_json::json;
use weather_bot::weather::WeatherReport;

proptest! {
    #[test]
    fn rendered_report_has_integer_temperature_and_verbatim_description(
        temp in -130.0f64..140.0,
        description in "[a-z][a-z ]{0,30}",
        city in "[A-Z][a-z]{1,15}",
    ) {
        let payload = json!({
            "main": { "temp": temp },
            "weather": [{ "description": description }]
        });
        let report = WeatherReport::from_payload(&city, &payload).unwrap();
        let rendered = report.to_string();

        let expected_temp = temp.round_ties_even() as i64;
        prop_assert_eq!(
            &rendered,
            &format!("In {city}, the current weather is: {expected_temp}F with {description}")
        );

        let temp_field = rendered
            .split(": ")
            .nth(1)
            .and_then(|rest| rest.split('F').next())
            .unwrap();
        prop_assert!(!temp_field.contains('.'));
        prop_assert!(rendered.ends_with(&description));
    }
}
