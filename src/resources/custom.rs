use serde::Serialize;

use crate::template::{get_att, CfnResource, StrVal};

/// handler for [`EndpointNetworkInterfaces`]. It answers with one
/// `NetworkInterfaces.<i>.PrivateIpAddress` attribute per interface id, in the
/// order the ids were given.
pub const ENDPOINT_IPS_HANDLER: &str = include_str!("../../assets/endpoint_ips.py");

/// looks up the private IP addresses of a set of network interfaces at deploy time.
/// Needed because an interface endpoint only exposes the ids of its interfaces,
/// and the addresses are not known until the endpoint exists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointNetworkInterfaces {
    pub service_token: StrVal,
    /// a list valued expression, eg: `Fn::GetAtt [Endpoint, NetworkInterfaceIds]`
    pub network_interface_ids: StrVal,
}

impl CfnResource for EndpointNetworkInterfaces {
    const TYPE: &'static str = "Custom::EndpointNetworkInterfaces";
}

/// the private address of interface `index` as reported by the lookup `logical_id`
pub fn private_ip_address(logical_id: &str, index: usize) -> StrVal {
    get_att(logical_id, &format!("NetworkInterfaces.{index}.PrivateIpAddress"))
}
