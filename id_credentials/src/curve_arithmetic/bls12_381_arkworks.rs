use ark_bls12_381::{g1, g2, Fq12, Fr};
use ark_ec::{
    hashing::{curve_maps::wb::WBMap, map_to_curve_hasher::MapToCurveBasedHasher},
    pairing::Pairing as ArkPairing,
    short_weierstrass::Projective,
};
use ark_ff::field_hashers::DefaultFieldHasher;
use sha2::Sha256;

use super::{
    arkworks_instances::{ArkCurveConfig, ArkField, ArkGroup},
    Pairing,
};

/// The BLS12-381 pairing.
pub type Bls12 = ark_ec::bls12::Bls12<ark_bls12_381::Config>;
/// The first source group of [Bls12]. All commitments, encryptions and
/// pseudonyms live here.
pub type G1 = ArkGroup<Projective<g1::Config>>;
/// The second source group of [Bls12].
pub type G2 = ArkGroup<Projective<g2::Config>>;

impl ArkCurveConfig for Projective<g1::Config> {
    type Hasher = MapToCurveBasedHasher<
        Projective<g1::Config>,
        DefaultFieldHasher<Sha256, 128>,
        WBMap<g1::Config>,
    >;

    const DOMAIN_STRING: &'static str = "BLS12381G1";
    const GROUP_ELEMENT_LENGTH: usize = 48;
    const SCALAR_LENGTH: usize = 32;
}

impl ArkCurveConfig for Projective<g2::Config> {
    type Hasher = MapToCurveBasedHasher<
        Projective<g2::Config>,
        DefaultFieldHasher<Sha256, 128>,
        WBMap<g2::Config>,
    >;

    const DOMAIN_STRING: &'static str = "BLS12381G2";
    const GROUP_ELEMENT_LENGTH: usize = 96;
    const SCALAR_LENGTH: usize = 32;
}

impl Pairing for Bls12 {
    type G1 = G1;
    type G2 = G2;
    type ScalarField = ArkField<Fr>;
    type TargetField = ArkField<Fq12>;

    #[inline(always)]
    fn pair(p: &Self::G1, q: &Self::G2) -> Self::TargetField {
        ArkField(<Bls12 as ArkPairing>::pairing(p.into_ark(), q.into_ark()).0)
    }

    #[inline(always)]
    fn pairing_product(
        g1x: &Self::G1,
        g2x: &Self::G2,
        g1y: &Self::G1,
        g2y: &Self::G2,
    ) -> Self::TargetField {
        let res = <Bls12 as ArkPairing>::multi_pairing(
            [g1x.into_ark(), g1y.into_ark()],
            [g2x.into_ark(), g2y.into_ark()],
        );
        ArkField(res.0)
    }
}
