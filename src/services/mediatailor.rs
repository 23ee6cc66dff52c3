//! AWS Elemental MediaTailor operations.
//!
//! REST-JSON protocol. Path labels come from parameters bound with
//! [`ParamSpec::in_path`]; list operations take their paging parameters
//! either in the query string (`ListChannels`) or in the body
//! (`ListPrefetchSchedules`).

use crate::http::HttpMethod;
use crate::model::{
    ConfirmImpact, OperationDescriptor, PaginationDescriptor, ParamSpec, Protocol, ServiceDescriptor, Shape,
};

/// The MediaTailor service descriptor.
pub fn service() -> ServiceDescriptor {
    ServiceDescriptor::new("MediaTailor", "api.mediatailor", Protocol::RestJson)
}

/// All MediaTailor operations in the catalog.
pub fn operations() -> Vec<OperationDescriptor> {
    vec![
        create_channel(),
        delete_channel(),
        list_channels(),
        create_prefetch_schedule(),
        list_prefetch_schedules(),
    ]
}

const CHANNEL_FIELDS: [&str; 11] = [
    "Arn",
    "ChannelName",
    "ChannelState",
    "CreationTime",
    "FillerSlate",
    "LastModifiedTime",
    "Outputs",
    "PlaybackMode",
    "Tags",
    "Tier",
    "TimeShiftConfiguration",
];

const PREFETCH_FIELDS: [&str; 6] = [
    "Arn",
    "Consumption",
    "Name",
    "PlaybackConfigurationName",
    "Retrieval",
    "StreamId",
];

fn slate_source() -> Vec<ParamSpec> {
    vec![ParamSpec::string("SourceLocationName"), ParamSpec::string("VodSourceName")]
}

fn request_output_item() -> Shape {
    Shape::Structure(vec![
        ParamSpec::string("ManifestName").required(),
        ParamSpec::string("SourceGroup").required(),
        ParamSpec::structure(
            "HlsPlaylistSettings",
            vec![
                ParamSpec::string_list("AdMarkupType"),
                ParamSpec::integer("ManifestWindowSeconds"),
            ],
        ),
        ParamSpec::structure(
            "DashPlaylistSettings",
            vec![
                ParamSpec::integer("ManifestWindowSeconds"),
                ParamSpec::integer("MinBufferTimeSeconds"),
                ParamSpec::integer("MinUpdatePeriodSeconds"),
                ParamSpec::integer("SuggestedPresentationDelaySeconds"),
            ],
        ),
    ])
}

/// Creates a channel. `PlaybackMode` is `LOOP` or `LINEAR`.
pub fn create_channel() -> OperationDescriptor {
    OperationDescriptor::new(service(), "CreateChannel")
        .http(HttpMethod::POST, "/channel/{ChannelName}")
        .param(ParamSpec::string("ChannelName").required().in_path())
        .param(ParamSpec::structure("FillerSlate", slate_source()))
        .param(ParamSpec::list("Outputs", request_output_item()).required())
        .param(ParamSpec::string("PlaybackMode").required())
        .param(ParamSpec::string_map("Tags").serialized_as("tags"))
        .param(ParamSpec::string("Tier"))
        .param(ParamSpec::structure(
            "TimeShiftConfiguration",
            vec![ParamSpec::integer("MaxTimeDelaySeconds").required()],
        ))
        .response_fields(CHANNEL_FIELDS)
        .default_selector("*")
        .confirm_impact(ConfirmImpact::Medium)
}

/// Deletes a channel.
pub fn delete_channel() -> OperationDescriptor {
    OperationDescriptor::new(service(), "DeleteChannel")
        .http(HttpMethod::DELETE, "/channel/{ChannelName}")
        .param(ParamSpec::string("ChannelName").required().in_path())
        .default_selector("*")
        .confirm_impact(ConfirmImpact::High)
}

/// Lists channels. Paging parameters travel in the query string.
pub fn list_channels() -> OperationDescriptor {
    OperationDescriptor::new(service(), "ListChannels")
        .http(HttpMethod::GET, "/channels")
        .param(ParamSpec::integer("MaxResults").in_query("maxResults"))
        .param(ParamSpec::string("NextToken").in_query("nextToken"))
        .response_fields(["Items", "NextToken"])
        .default_selector("Items")
        .paginated(PaginationDescriptor::new("NextToken", "NextToken", "Items").with_page_size("MaxResults"))
}

/// Creates a prefetch schedule for a playback configuration.
///
/// `Consumption.EndTime` and `Retrieval.EndTime` are required once their
/// structure is supplied.
pub fn create_prefetch_schedule() -> OperationDescriptor {
    OperationDescriptor::new(service(), "CreatePrefetchSchedule")
        .http(HttpMethod::POST, "/prefetchSchedule/{PlaybackConfigurationName}/{Name}")
        .param(ParamSpec::string("Name").required().in_path())
        .param(ParamSpec::string("PlaybackConfigurationName").required().in_path())
        .param(
            ParamSpec::structure(
                "Consumption",
                vec![
                    ParamSpec::timestamp("EndTime").required(),
                    ParamSpec::timestamp("StartTime"),
                    ParamSpec::list(
                        "AvailMatchingCriteria",
                        Shape::Structure(vec![
                            ParamSpec::string("DynamicVariable").required(),
                            ParamSpec::string("Operator").required(),
                        ]),
                    ),
                ],
            )
            .required(),
        )
        .param(
            ParamSpec::structure(
                "Retrieval",
                vec![
                    ParamSpec::timestamp("EndTime").required(),
                    ParamSpec::timestamp("StartTime"),
                    ParamSpec::string_map("DynamicVariables"),
                ],
            )
            .required(),
        )
        .param(ParamSpec::string("StreamId"))
        .response_fields(PREFETCH_FIELDS)
        .default_selector("*")
        .confirm_impact(ConfirmImpact::Low)
}

/// Lists prefetch schedules. Paging parameters travel in the JSON body.
pub fn list_prefetch_schedules() -> OperationDescriptor {
    OperationDescriptor::new(service(), "ListPrefetchSchedules")
        .http(HttpMethod::POST, "/prefetchSchedule/{PlaybackConfigurationName}")
        .param(ParamSpec::string("PlaybackConfigurationName").required().in_path())
        .param(ParamSpec::integer("MaxResults"))
        .param(ParamSpec::string("NextToken"))
        .param(ParamSpec::string("StreamId"))
        .response_fields(["Items", "NextToken"])
        .default_selector("Items")
        .paginated(PaginationDescriptor::new("NextToken", "NextToken", "Items").with_page_size("MaxResults"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{Inputs, RequestBuilder};
    use crate::error::OperationError;
    use crate::protocol::encode_request;
    use serde_json::{json, Value};

    fn channel_inputs() -> Inputs {
        Inputs::new()
            .with("ChannelName", "live")
            .with("PlaybackMode", "LOOP")
            .with("Outputs", json!([{"ManifestName": "index", "SourceGroup": "hls"}]))
    }

    #[test]
    fn test_create_channel_omits_unset_substructures() {
        let op = create_channel();
        let built = RequestBuilder::new(&op).build(&channel_inputs()).unwrap();
        assert!(built.member("FillerSlate").is_none());
        assert!(built.member("TimeShiftConfiguration").is_none());

        let request = encode_request(&op, &built).unwrap();
        assert_eq!(request.path(), "/channel/live");
        let body: Value = serde_json::from_slice(request.body_bytes().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "Outputs": [{"ManifestName": "index", "SourceGroup": "hls"}],
                "PlaybackMode": "LOOP"
            })
        );
    }

    #[test]
    fn test_create_channel_filler_slate_from_leaves() {
        let op = create_channel();
        let inputs = channel_inputs()
            .with("FillerSlate.SourceLocationName", "loc")
            .with("Tags", json!({"team": "video"}));
        let built = RequestBuilder::new(&op).build(&inputs).unwrap();
        assert_eq!(built.member("FillerSlate"), Some(&json!({"SourceLocationName": "loc"})));

        let request = encode_request(&op, &built).unwrap();
        let body: Value = serde_json::from_slice(request.body_bytes().unwrap()).unwrap();
        assert_eq!(body["tags"], json!({"team": "video"}));
        assert!(body.get("Tags").is_none());
    }

    #[test]
    fn test_list_channels_paging_in_query() {
        let op = list_channels();
        let built = RequestBuilder::new(&op)
            .build(&Inputs::new().with("MaxResults", 25).with("NextToken", "abc"))
            .unwrap();

        let request = encode_request(&op, &built).unwrap();
        assert_eq!(request.method(), HttpMethod::GET);
        assert_eq!(request.query_param("maxResults"), Some("25"));
        assert_eq!(request.query_param("nextToken"), Some("abc"));
        assert!(request.body_bytes().is_none());
    }

    #[test]
    fn test_prefetch_schedule_timestamps_and_required_leaves() {
        let op = create_prefetch_schedule();
        let inputs = Inputs::new()
            .with("Name", "ad-break")
            .with("PlaybackConfigurationName", "main")
            .with("Consumption.EndTime", "2024-01-01T00:10:00Z")
            .with("Retrieval.EndTime", "2024-01-01T00:05:00Z")
            .with("Retrieval.DynamicVariables", json!({"scte.event_id": "1"}));
        let built = RequestBuilder::new(&op).build(&inputs).unwrap();

        let request = encode_request(&op, &built).unwrap();
        assert_eq!(request.path(), "/prefetchSchedule/main/ad-break");
        let body: Value = serde_json::from_slice(request.body_bytes().unwrap()).unwrap();
        assert_eq!(body["Consumption"], json!({"EndTime": 1704067800}));
        assert_eq!(
            body["Retrieval"],
            json!({"EndTime": 1704067500, "DynamicVariables": {"scte.event_id": "1"}})
        );

        let missing = Inputs::new()
            .with("Name", "ad-break")
            .with("PlaybackConfigurationName", "main")
            .with("Consumption.StartTime", "2024-01-01T00:00:00Z")
            .with("Retrieval.EndTime", "2024-01-01T00:05:00Z");
        assert!(matches!(
            RequestBuilder::new(&op).build(&missing),
            Err(OperationError::MissingRequiredField { field }) if field == "Consumption.EndTime"
        ));
    }
}
