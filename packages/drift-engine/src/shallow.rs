//! shallow.rs — Shallow-water physics and shore interaction
//!
//! Below 20 m the open-water drift picture breaks down: the bottom steals
//! momentum, waves feel the seabed and their Stokes transport grows, and
//! inside the surf zone breaking waves, longshore currents, rips, and
//! undertow take over. This module turns a field sample plus a local depth
//! into an extra displacement, a per-step beaching probability, and the set
//! of processes that actually fired.
//!
//! Depth gates: corrections apply strictly below 20 m; the surf zone engages
//! at 5 m and the very-shallow regime at 2 m (both inclusive). Breaking
//! requires H/d strictly above 0.78.

use crate::geo::KmVector;
use drift_types::{EnvironmentalSnapshot, ShoreKind, SurfEffect};
use rand::Rng;

pub const GRAVITY_MPS2: f64 = 9.81;
/// Manning roughness for a sandy/mixed seabed.
pub const MANNING_N: f64 = 0.025;

pub const SHALLOW_DEPTH_M: f64 = 20.0;
pub const SURF_ZONE_DEPTH_M: f64 = 5.0;
pub const VERY_SHALLOW_DEPTH_M: f64 = 2.0;
/// Breaker index: waves break where H/d exceeds this.
pub const BREAKING_INDEX: f64 = 0.78;

const MPS_TO_KMH: f64 = 3.6;

// ── Wave dispersion ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct DispersionSolution {
    /// Wavenumber, rad/m.
    pub k: f64,
    /// False when Newton iteration hit the cap and the deep-water
    /// wavenumber was substituted.
    pub converged: bool,
}

/// Solve ω² = g·k·tanh(k·d) for k by Newton iteration.
///
/// Starts from the deep-water wavenumber k₀ = ω²/g; at most 20 iterations,
/// tolerance 1e-10. On divergence the deep-water k is returned and flagged.
pub fn wave_number(omega: f64, depth_m: f64) -> DispersionSolution {
    let deep_k = omega * omega / GRAVITY_MPS2;
    if depth_m <= 0.0 || omega <= 0.0 {
        return DispersionSolution { k: deep_k, converged: false };
    }

    let mut k = deep_k;
    for _ in 0..20 {
        let kd = k * depth_m;
        let tanh_kd = kd.tanh();
        let f = GRAVITY_MPS2 * k * tanh_kd - omega * omega;
        let df = GRAVITY_MPS2 * tanh_kd + GRAVITY_MPS2 * k * depth_m * (1.0 - tanh_kd * tanh_kd);
        if df.abs() < f64::EPSILON {
            break;
        }
        let next = k - f / df;
        if (next - k).abs() < 1e-10 {
            return DispersionSolution { k: next, converged: true };
        }
        k = next;
    }
    DispersionSolution { k: deep_k, converged: false }
}

/// Finite-depth enhancement of the surface Stokes velocity.
pub fn stokes_enhancement(k: f64, depth_m: f64) -> f64 {
    1.0 + 1.0 / (2.0 * (2.0 * k * depth_m).sinh())
}

/// Surface Stokes drift speed in finite depth, m/s.
///
/// U_s = π·H²·c/(T·λ) · (1 + 1/(2·sinh(2kd))) with c = λ/T, λ = 2π/k.
pub fn shallow_stokes_speed_mps(height_m: f64, period_s: f64, depth_m: f64) -> (f64, bool) {
    if height_m <= 0.0 || period_s <= 0.0 {
        return (0.0, true);
    }
    let omega = std::f64::consts::TAU / period_s;
    let solution = wave_number(omega, depth_m);
    let wavelength = std::f64::consts::TAU / solution.k;
    let celerity = wavelength / period_s;
    let base = std::f64::consts::PI * height_m * height_m * celerity / (period_s * wavelength);
    (base * stokes_enhancement(solution.k, depth_m), solution.converged)
}

// ── Shallow-water correction ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ShallowOutcome {
    pub drift: KmVector,
    /// Probability accumulated this step that the object strands.
    pub beaching_probability: f64,
    pub effects: Vec<SurfEffect>,
    /// Dispersion solver fell back to the deep-water wavenumber.
    pub dispersion_fallback: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ShallowWaterPhysics {
    pub manning_n: f64,
    pub breaking_index: f64,
}

impl Default for ShallowWaterPhysics {
    fn default() -> Self {
        Self { manning_n: MANNING_N, breaking_index: BREAKING_INDEX }
    }
}

impl ShallowWaterPhysics {
    /// Extra drift for a particle at `depth_m` (0 < depth < 20) given the
    /// local field sample. `dt_hours` is the step length.
    pub fn apply(
        &self,
        depth_m: f64,
        sample: &EnvironmentalSnapshot,
        dt_hours: f64,
    ) -> ShallowOutcome {
        let mut out = ShallowOutcome::default();
        let current_kmh = crate::geo::knots_to_kmh(sample.current.speed_kn);
        let wave_h = sample.waves.height_m;

        // 1. Bottom friction drains the current over a rough bed.
        if current_kmh > 0.0 {
            let friction = GRAVITY_MPS2 * self.manning_n * self.manning_n * depth_m.powf(-1.0 / 3.0);
            let reduction = (friction * current_kmh).min(0.8);
            let loss_kmh = reduction * current_kmh * 1e-3;
            out.drift = out
                .drift
                .add(&KmVector::toward(sample.current.direction_deg, -loss_kmh * dt_hours));
            out.effects.push(SurfEffect::BottomFriction);
        }

        // 2. Finite-depth Stokes transport.
        if wave_h > 0.0 && sample.waves.period_s > 0.0 {
            let (stokes_mps, converged) =
                shallow_stokes_speed_mps(wave_h, sample.waves.period_s, depth_m);
            out.drift = out.drift.add(&KmVector::toward(
                sample.waves.direction_deg,
                stokes_mps * MPS_TO_KMH * dt_hours,
            ));
            out.effects.push(SurfEffect::ShallowStokes);
            out.dispersion_fallback = !converged;
        }

        // 3. Topographic steering along isobaths.
        if let Some(grad) = &sample.bathymetry {
            if grad.magnitude > 1e-3 && current_kmh > 0.0 {
                let isobath_rad = (-grad.dz_dx).atan2(grad.dz_dy);
                let current_rad = sample.current.direction_deg.to_radians();
                let strength_kmh =
                    0.1 * current_kmh * grad.magnitude * (isobath_rad - current_rad).sin();
                out.drift = out.drift.add(&KmVector::toward(
                    isobath_rad.to_degrees(),
                    strength_kmh * dt_hours,
                ));
                out.effects.push(SurfEffect::TopographicSteering);
            }
        }

        // 4. Tidal asymmetry: flood pushes onshore, ebb (weaker) offshore.
        if let Some(tide) = &sample.tide {
            let amplitude = 0.1 * (SHALLOW_DEPTH_M / depth_m);
            let offset_km = if tide.phase < 0.5 {
                amplitude * (std::f64::consts::PI * tide.phase).sin() * dt_hours
            } else {
                -0.7 * amplitude * (std::f64::consts::PI * (tide.phase - 0.5)).sin() * dt_hours
            };
            out.drift = out
                .drift
                .add(&KmVector::toward(tide.shore_direction_deg, offset_km));
            out.effects.push(SurfEffect::TidalAsymmetry);
        }

        // 5. Surf zone.
        if depth_m <= SURF_ZONE_DEPTH_M {
            self.apply_surf_zone(depth_m, sample, dt_hours, &mut out);
        }

        // 6. Very shallow: the remaining current nearly stalls.
        if depth_m <= VERY_SHALLOW_DEPTH_M {
            let reduction = 0.5 * (1.0 - depth_m / VERY_SHALLOW_DEPTH_M);
            if current_kmh > 0.0 {
                out.drift = out.drift.add(&KmVector::toward(
                    sample.current.direction_deg,
                    -current_kmh * reduction * dt_hours,
                ));
            }
            out.beaching_probability += 0.3 * (1.0 - depth_m / VERY_SHALLOW_DEPTH_M) * dt_hours;
            out.effects.push(SurfEffect::VeryShallowFriction);
        }

        out
    }

    fn apply_surf_zone(
        &self,
        depth_m: f64,
        sample: &EnvironmentalSnapshot,
        dt_hours: f64,
        out: &mut ShallowOutcome,
    ) {
        let wave_h = sample.waves.height_m;
        let wave_dir = sample.waves.direction_deg;

        // Breaking transport.
        if wave_h / depth_m > self.breaking_index {
            let bore_mps = 0.015 * (GRAVITY_MPS2 * depth_m).sqrt() * (wave_h / depth_m);
            out.drift = out
                .drift
                .add(&KmVector::toward(wave_dir, bore_mps * MPS_TO_KMH * dt_hours));
            out.beaching_probability += 0.15 * dt_hours;
            out.effects.push(SurfEffect::WaveBreaking);
        }

        // Longuet-Higgins longshore current from oblique breakers.
        let shore_normal = sample
            .waves
            .shore_normal_deg
            .or_else(|| sample.tide.as_ref().map(|t| t.shore_normal_deg));
        if let Some(normal) = shore_normal {
            if wave_h > 0.0 {
                let breaker_h = wave_h.min(self.breaking_index * depth_m);
                let obliquity = 2.0 * (wave_dir - normal).to_radians();
                let longshore_mps = 0.2 * (GRAVITY_MPS2 * breaker_h).sqrt() * obliquity.sin();
                if longshore_mps.abs() > 1e-9 {
                    out.drift = out.drift.add(&KmVector::toward(
                        normal + 90.0,
                        longshore_mps * MPS_TO_KMH * dt_hours,
                    ));
                    out.effects.push(SurfEffect::LongshoreCurrent);
                }
            }
        }

        // Rip current.
        if let Some(rip) = &sample.rip_current {
            if rip.risk > 0.5 {
                out.drift = out.drift.add(&KmVector::toward(
                    rip.direction_deg,
                    1.5 * rip.strength_mps * MPS_TO_KMH * dt_hours,
                ));
                out.effects.push(SurfEffect::RipCurrent);
            }
        }

        // Undertow opposes the wave direction near the bed.
        if wave_h > 0.0 {
            let undertow_mps = 0.2 * (wave_h / depth_m) * (3.0 / depth_m).min(1.0);
            out.drift = out.drift.add(&KmVector::toward(
                wave_dir + 180.0,
                undertow_mps * MPS_TO_KMH * dt_hours,
            ));
            out.effects.push(SurfEffect::Undertow);
        }
    }
}

// ── Shore interaction ─────────────────────────────────────────────────────────

/// Behavior of a shoreline substrate when an object reaches it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShoreProfile {
    /// Probability the object strands on contact.
    pub stickiness: f64,
    /// Probability it bounces back seaward instead.
    pub reflection: f64,
    /// Scales the angular scatter of a reflection, in [0, 1].
    pub roughness: f64,
    /// How strongly the substrate retains stranded objects, in [0, 1].
    pub permeability: f64,
}

pub fn shore_profile(kind: ShoreKind) -> ShoreProfile {
    let (stickiness, reflection, roughness, permeability) = match kind {
        ShoreKind::Rocky => (0.85, 0.15, 1.0, 0.1),
        ShoreKind::Sandy => (0.60, 0.30, 0.5, 0.4),
        ShoreKind::Muddy => (0.95, 0.05, 0.3, 0.7),
        ShoreKind::Marsh => (1.00, 0.00, 0.2, 0.9),
        ShoreKind::Mangrove => (1.00, 0.00, 0.4, 0.95),
        ShoreKind::Seawall => (0.10, 0.90, 0.1, 0.0),
        ShoreKind::Riprap => (0.40, 0.50, 0.9, 0.6),
        ShoreKind::Coral => (0.70, 0.20, 0.8, 0.3),
    };
    ShoreProfile { stickiness, reflection, roughness, permeability }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShoreOutcome {
    /// Strand the particle.
    Beach,
    /// Bounce seaward by `distance_km` toward `direction_deg`.
    Reflect { distance_km: f64, direction_deg: f64 },
    /// Discard the move; the particle holds its position.
    Hold,
}

/// Decide what happens when a move would land at `shore_kind`.
///
/// `shore_normal_deg` points seaward; a reflection bounces 10–30 m along it
/// with scatter scaled by substrate roughness. (Equivalent to the landward
/// normal plus 180°.)
pub fn shore_interaction(
    shore_kind: ShoreKind,
    shore_normal_deg: f64,
    rng: &mut impl Rng,
) -> ShoreOutcome {
    let profile = shore_profile(shore_kind);
    let draw: f64 = rng.gen_range(0.0..1.0);

    if draw < profile.stickiness {
        ShoreOutcome::Beach
    } else if draw < profile.stickiness + profile.reflection {
        let scatter = rng.gen_range(-30.0..=30.0) * profile.roughness;
        ShoreOutcome::Reflect {
            distance_km: rng.gen_range(0.01..=0.03),
            direction_deg: shore_normal_deg + scatter,
        }
    } else {
        ShoreOutcome::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_types::{
        BathymetryGradient, CurrentConditions, TidalConditions, WaveConditions, WindConditions,
    };

    fn sample(current_kn: f64, wave_h: f64, wave_t: f64) -> EnvironmentalSnapshot {
        EnvironmentalSnapshot {
            wind: WindConditions { speed_kn: 0.0, direction_deg: 0.0, gusts_kn: None },
            current: CurrentConditions {
                speed_kn: current_kn,
                direction_deg: 90.0,
                variation_kn: 0.0,
            },
            waves: WaveConditions {
                height_m: wave_h,
                period_s: wave_t,
                direction_deg: 0.0,
                shore_normal_deg: None,
            },
            water_temp_f: 68.0,
            air_temp_f: 70.0,
            visibility_nm: 10.0,
            sea_state: 3,
            tide: None,
            bathymetry: None,
            rip_current: None,
        }
    }

    #[test]
    fn dispersion_satisfies_the_relation() {
        let omega = std::f64::consts::TAU / 6.0;
        let sol = wave_number(omega, 2.0);
        assert!(sol.converged);
        let residual = GRAVITY_MPS2 * sol.k * (sol.k * 2.0).tanh() - omega * omega;
        assert!(residual.abs() < 1e-8, "residual {residual}");
    }

    #[test]
    fn deep_water_limit_recovers_omega_sq_over_g() {
        let omega = std::f64::consts::TAU / 8.0;
        let sol = wave_number(omega, 4000.0);
        assert!(sol.converged);
        let deep = omega * omega / GRAVITY_MPS2;
        assert!((sol.k - deep).abs() / deep < 1e-6);
    }

    #[test]
    fn shallow_stokes_dwarfs_the_open_water_baseline() {
        // H = 1 m, T = 6 s, d = 2 m versus the open-water H²/T·k_s transport
        let (speed_mps, converged) = shallow_stokes_speed_mps(1.0, 6.0, 2.0);
        assert!(converged);
        let baseline_kmh = 1.0 * 1.0 / 6.0 * 0.01;
        assert!(
            speed_mps * MPS_TO_KMH >= 3.0 * baseline_kmh,
            "shallow Stokes {} km/h should exceed 3× the {baseline_kmh} km/h baseline",
            speed_mps * MPS_TO_KMH
        );
    }

    #[test]
    fn enhancement_decays_toward_unity_in_deep_water() {
        let omega = std::f64::consts::TAU / 6.0;
        let shallow = wave_number(omega, 2.0);
        let deep = wave_number(omega, 500.0);
        assert!(stokes_enhancement(shallow.k, 2.0) > stokes_enhancement(deep.k, 500.0));
        assert!((stokes_enhancement(deep.k, 500.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn breaking_gate_is_strict() {
        let physics = ShallowWaterPhysics::default();
        // H/d exactly 0.78 — no breaking
        let at_index = physics.apply(1.0, &sample(0.0, 0.78, 6.0), 1.0);
        assert!(!at_index.effects.contains(&SurfEffect::WaveBreaking));
        // just above — breaking
        let above = physics.apply(1.0, &sample(0.0, 0.79, 6.0), 1.0);
        assert!(above.effects.contains(&SurfEffect::WaveBreaking));
        assert!(above.beaching_probability > 0.0);
    }

    #[test]
    fn surf_zone_only_below_five_meters() {
        let physics = ShallowWaterPhysics::default();
        let outside = physics.apply(5.5, &sample(0.0, 5.0, 6.0), 1.0);
        assert!(!outside.effects.contains(&SurfEffect::Undertow));
        let inside = physics.apply(5.0, &sample(0.0, 1.0, 6.0), 1.0);
        assert!(inside.effects.contains(&SurfEffect::Undertow));
    }

    #[test]
    fn very_shallow_adds_beaching_pressure() {
        let physics = ShallowWaterPhysics::default();
        let out = physics.apply(1.0, &sample(1.0, 0.0, 6.0), 1.0);
        assert!(out.effects.contains(&SurfEffect::VeryShallowFriction));
        assert!((out.beaching_probability - 0.15).abs() < 1e-12); // 0.3·(1 − 0.5)
    }

    #[test]
    fn tidal_flood_pushes_onshore_ebb_pulls_back() {
        let physics = ShallowWaterPhysics::default();
        let mut s = sample(0.0, 0.0, 6.0);
        s.tide = Some(TidalConditions {
            phase: 0.25,
            shore_direction_deg: 0.0, // shore due north
            shore_normal_deg: 180.0,
        });
        let flood = physics.apply(10.0, &s, 1.0);
        assert!(flood.drift.north > 0.0, "flood should push toward shore");

        s.tide.as_mut().unwrap().phase = 0.75;
        let ebb = physics.apply(10.0, &s, 1.0);
        assert!(ebb.drift.north < 0.0, "ebb should pull offshore");
        assert!(ebb.drift.north.abs() < flood.drift.north, "ebb is the weaker phase");
    }

    #[test]
    fn longshore_vanishes_at_normal_incidence() {
        let physics = ShallowWaterPhysics::default();
        let mut s = sample(0.0, 1.0, 6.0);
        // waves travel due north onto a shore whose normal is due north
        s.waves.shore_normal_deg = Some(0.0);
        let out = physics.apply(3.0, &s, 1.0);
        assert!(!out.effects.contains(&SurfEffect::LongshoreCurrent));
    }

    #[test]
    fn steering_follows_the_isobath() {
        let physics = ShallowWaterPhysics::default();
        let mut s = sample(1.0, 0.0, 6.0);
        s.bathymetry = Some(BathymetryGradient {
            dz_dx: 0.0,
            dz_dy: 0.5, // deepens northward; isobaths run east-west
            magnitude: 0.5,
            direction_deg: 0.0,
        });
        let out = physics.apply(10.0, &s, 1.0);
        assert!(out.effects.contains(&SurfEffect::TopographicSteering));
    }

    #[test]
    fn marsh_always_beaches_seawall_mostly_reflects() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            assert_eq!(
                shore_interaction(ShoreKind::Marsh, 180.0, &mut rng),
                ShoreOutcome::Beach
            );
        }
        let mut reflected = 0;
        for _ in 0..1000 {
            if matches!(
                shore_interaction(ShoreKind::Seawall, 180.0, &mut rng),
                ShoreOutcome::Reflect { .. }
            ) {
                reflected += 1;
            }
        }
        assert!(reflected > 800, "seawall reflected only {reflected}/1000");
    }

    #[test]
    fn reflection_heads_seaward() {
        let mut rng = rand::thread_rng();
        // Seaward normal 180 (water to the south): reflections head ~south
        for _ in 0..200 {
            if let ShoreOutcome::Reflect { distance_km, direction_deg } =
                shore_interaction(ShoreKind::Sandy, 180.0, &mut rng)
            {
                assert!((0.01..=0.03).contains(&distance_km));
                assert!(
                    (direction_deg - 180.0).abs() <= 30.0 + 1e-9,
                    "reflection direction {direction_deg} not seaward"
                );
            }
        }
    }
}
