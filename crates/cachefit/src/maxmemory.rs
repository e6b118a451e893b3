//! Exact per-node-type `maxmemory` values.
//!
//! ElastiCache publishes node-type specific default values for the Redis
//! `maxmemory` parameter; these are noticeably smaller than the advertised
//! instance memory. When a node type appears here the catalog uses the exact
//! value instead of approximating from the advertised size.
//!
//! Derived from the node-specific parameter table in the ElastiCache Redis
//! user guide.

/// Look up the published `maxmemory` value in bytes for a cache node type.
pub fn known_maxmemory(instance_type: &str) -> Option<u64> {
    let bytes = match instance_type {
        "cache.t2.micro" => 581_959_680,
        "cache.t2.small" => 1_665_138_688,
        "cache.t2.medium" => 3_461_349_376,

        "cache.t3.micro" => 536_870_912,
        "cache.t3.small" => 1_471_182_336,
        "cache.t3.medium" => 3_317_862_400,

        "cache.t4g.micro" => 536_870_912,
        "cache.t4g.small" => 1_471_182_336,
        "cache.t4g.medium" => 3_317_862_400,

        "cache.m5.large" => 6_854_542_746,
        "cache.m5.xlarge" => 13_891_921_715,
        "cache.m5.2xlarge" => 27_966_669_210,
        "cache.m5.4xlarge" => 56_116_178_125,
        "cache.m5.12xlarge" => 170_234_298_778,
        "cache.m5.24xlarge" => 340_468_597_556,

        "cache.m6g.large" => 6_763_315_200,
        "cache.m6g.xlarge" => 13_526_630_400,
        "cache.m6g.2xlarge" => 27_053_260_800,
        "cache.m6g.4xlarge" => 54_106_521_600,
        "cache.m6g.8xlarge" => 108_213_043_200,
        "cache.m6g.12xlarge" => 162_319_564_800,
        "cache.m6g.16xlarge" => 216_426_086_400,

        "cache.r4.large" => 13_201_781_556,
        "cache.r4.xlarge" => 26_898_228_839,
        "cache.r4.2xlarge" => 54_063_403_351,
        "cache.r4.4xlarge" => 108_423_814_447,
        "cache.r4.8xlarge" => 217_179_869_184,
        "cache.r4.16xlarge" => 437_021_725_696,

        "cache.r5.large" => 14_037_181_030,
        "cache.r5.xlarge" => 28_261_849_702,
        "cache.r5.2xlarge" => 56_711_183_565,
        "cache.r5.4xlarge" => 113_609_865_216,
        "cache.r5.12xlarge" => 341_206_346_547,
        "cache.r5.24xlarge" => 682_975_982_543,

        "cache.r6g.large" => 14_470_348_800,
        "cache.r6g.xlarge" => 28_940_697_600,
        "cache.r6g.2xlarge" => 57_881_395_200,
        "cache.r6g.4xlarge" => 115_762_790_400,
        "cache.r6g.8xlarge" => 231_525_580_800,
        "cache.r6g.12xlarge" => 347_288_371_200,
        "cache.r6g.16xlarge" => 463_051_161_600,

        _ => return None,
    };
    Some(bytes)
}
