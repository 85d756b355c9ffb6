//! Scene description parser.
//!
//! One directive per line: a keyword followed by fields separated by
//! whitespace and/or commas. Blank lines and lines starting with `#` or `//`
//! are skipped.
//!
//! # Supported Syntax
//!
//! - `camera px py pz dx dy dz fov [ux uy uz]`
//! - `light px py pz [intensity]`
//! - `ambient value`
//! - `sphere cx cy cz radius [albedo] [orbit cx cy cz deg_per_sec]`
//! - `plane px py pz nx ny nz [albedo]`
//! - `mesh name tx ty tz [scale [albedo]] [spin ax ay az deg_per_sec] [orbit cx cy cz deg_per_sec]`

use std::collections::HashMap;
use std::sync::Arc;

use cosmo_math::{Camera, Vec3};
use thiserror::Error;

use crate::mesh::Mesh;
use crate::scene::{Light, Material, MeshInstance, Object, Orbit, Plane, Sphere, Spin, World};

/// Errors that can occur while parsing a scene.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("syntax error at line {line}: {reason}")]
    Syntax { line: usize, reason: String },

    #[error("line {line}: unknown mesh '{name}'")]
    UnknownMesh { line: usize, name: String },

    #[error("line {line}: scene already has a camera")]
    DuplicateCamera { line: usize },
}

/// Result type for parsing operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Parse scene lines into a [`World`], resolving mesh names against `meshes`.
pub fn parse_scene<I, S>(lines: I, meshes: &HashMap<String, Arc<Mesh>>) -> SceneResult<World>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = SceneParser::new(meshes);
    for (index, line) in lines.into_iter().enumerate() {
        parser.parse_line(index + 1, line.as_ref())?;
    }
    Ok(parser.finish())
}

/// Accumulates directives into a world.
struct SceneParser<'a> {
    meshes: &'a HashMap<String, Arc<Mesh>>,
    camera: Option<Camera>,
    ambient: Option<f32>,
    lights: Vec<Light>,
    objects: Vec<Object>,
}

impl<'a> SceneParser<'a> {
    fn new(meshes: &'a HashMap<String, Arc<Mesh>>) -> Self {
        Self {
            meshes,
            camera: None,
            ambient: None,
            lights: Vec::new(),
            objects: Vec::new(),
        }
    }

    fn parse_line(&mut self, line: usize, text: &str) -> SceneResult<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
            return Ok(());
        }

        let mut fields = Fields::new(line, trimmed)?;
        let Some(keyword) = fields.next() else {
            return Ok(());
        };

        match keyword {
            "camera" => self.parse_camera(&mut fields)?,
            "light" => self.parse_light(&mut fields)?,
            "ambient" => self.parse_ambient(&mut fields)?,
            "sphere" => self.parse_sphere(&mut fields)?,
            "plane" => self.parse_plane(&mut fields)?,
            "mesh" => self.parse_mesh(&mut fields)?,
            other => return Err(fields.error(format!("unknown directive '{other}'"))),
        }

        fields.finish()
    }

    fn parse_camera(&mut self, fields: &mut Fields) -> SceneResult<()> {
        if self.camera.is_some() {
            return Err(SceneError::DuplicateCamera { line: fields.line });
        }

        let position = fields.vec3("camera position")?;
        let direction = fields.direction("camera direction")?;
        let fov = fields.number("field of view")?;
        if !(fov > 0.0 && fov < 180.0) {
            return Err(fields.error(format!("field of view {fov} must be between 0 and 180 degrees")));
        }
        let vup = if fields.is_empty() {
            Vec3::Y
        } else {
            fields.direction("camera up vector")?
        };

        self.camera = Some(Camera::new().with_position(position, direction, vup).with_fov(fov));
        Ok(())
    }

    fn parse_light(&mut self, fields: &mut Fields) -> SceneResult<()> {
        let position = fields.vec3("light position")?;
        let intensity = fields.optional_number("light intensity")?.unwrap_or(1.0);
        if intensity < 0.0 {
            return Err(fields.error(format!("light intensity {intensity} is negative")));
        }

        self.lights.push(Light::new(position, intensity));
        Ok(())
    }

    fn parse_ambient(&mut self, fields: &mut Fields) -> SceneResult<()> {
        if self.ambient.is_some() {
            return Err(fields.error("ambient is already set"));
        }
        let ambient = fields.unit_number("ambient")?;
        self.ambient = Some(ambient);
        Ok(())
    }

    fn parse_sphere(&mut self, fields: &mut Fields) -> SceneResult<()> {
        let center = fields.vec3("sphere center")?;
        let radius = fields.number("sphere radius")?;
        if radius <= 0.0 {
            return Err(fields.error(format!("sphere radius {radius} must be positive")));
        }
        let material = fields.material()?;

        let mut sphere = Sphere::new(center, radius, material);
        while let Some(clause) = fields.next() {
            match clause {
                "orbit" => sphere = sphere.with_orbit(fields.orbit()?),
                other => return Err(fields.error(format!("unexpected '{other}' after sphere"))),
            }
        }

        self.objects.push(Object::Sphere(sphere));
        Ok(())
    }

    fn parse_plane(&mut self, fields: &mut Fields) -> SceneResult<()> {
        let point = fields.vec3("plane point")?;
        let normal = fields.direction("plane normal")?;
        let material = fields.material()?;

        self.objects.push(Object::Plane(Plane::new(point, normal, material)));
        Ok(())
    }

    fn parse_mesh(&mut self, fields: &mut Fields) -> SceneResult<()> {
        let name = fields
            .next()
            .ok_or_else(|| fields.error("missing mesh name"))?;
        let mesh = self
            .meshes
            .get(name)
            .cloned()
            .ok_or_else(|| SceneError::UnknownMesh {
                line: fields.line,
                name: name.to_string(),
            })?;

        let translation = fields.vec3("mesh position")?;
        let scale = fields.optional_number("mesh scale")?.unwrap_or(1.0);
        if scale <= 0.0 {
            return Err(fields.error(format!("mesh scale {scale} must be positive")));
        }
        let material = fields.material()?;

        let mut instance = MeshInstance::new(mesh, translation, scale, material);
        let mut seen_spin = false;
        let mut seen_orbit = false;
        while let Some(clause) = fields.next() {
            match clause {
                "spin" if !seen_spin => {
                    seen_spin = true;
                    let axis = fields.direction("spin axis")?;
                    let degrees_per_sec = fields.number("spin rate")?;
                    instance = instance.with_spin(Spin {
                        axis,
                        degrees_per_sec,
                    });
                }
                "orbit" if !seen_orbit => {
                    seen_orbit = true;
                    instance = instance.with_orbit(fields.orbit()?);
                }
                other => return Err(fields.error(format!("unexpected '{other}' after mesh"))),
            }
        }

        self.objects.push(Object::Mesh(instance));
        Ok(())
    }

    fn finish(self) -> World {
        let camera = self.camera.unwrap_or_else(|| {
            log::warn!("Scene has no camera, using the default camera");
            Camera::new()
        });

        let world = World {
            camera,
            lights: self.lights,
            objects: self.objects,
            ambient: self.ambient.unwrap_or(0.0),
        };

        log::info!(
            "Parsed scene: {} objects, {} lights, {} mesh triangles",
            world.objects.len(),
            world.lights.len(),
            world.triangle_count()
        );
        log::debug!("Scene bounds at t = 0: {:?}", world.bounding_box());
        world
    }
}

/// Cursor over the fields of one directive.
struct Fields<'t> {
    line: usize,
    tokens: std::iter::Peekable<std::vec::IntoIter<&'t str>>,
}

impl<'t> Fields<'t> {
    /// Split a directive into fields. Whitespace runs separate fields freely,
    /// but every comma must have a field on each side.
    fn new(line: usize, text: &'t str) -> SceneResult<Self> {
        let separated = text.contains(',');
        let mut tokens = Vec::new();
        for segment in text.split(',') {
            let before = tokens.len();
            tokens.extend(segment.split_whitespace());
            if separated && tokens.len() == before {
                return Err(SceneError::Syntax {
                    line,
                    reason: "empty field between separators".to_string(),
                });
            }
        }
        Ok(Self {
            line,
            tokens: tokens.into_iter().peekable(),
        })
    }

    fn error(&self, reason: impl Into<String>) -> SceneError {
        SceneError::Syntax {
            line: self.line,
            reason: reason.into(),
        }
    }

    fn next(&mut self) -> Option<&'t str> {
        self.tokens.next()
    }

    fn is_empty(&mut self) -> bool {
        self.tokens.peek().is_none()
    }

    fn parse_number(&self, token: &str, what: &str) -> SceneResult<f32> {
        match token.parse::<f32>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(self.error(format!("invalid number '{token}' for {what}"))),
        }
    }

    fn number(&mut self, what: &str) -> SceneResult<f32> {
        let token = self
            .tokens
            .next()
            .ok_or_else(|| self.error(format!("missing {what}")))?;
        self.parse_number(token, what)
    }

    /// Consume a number only if the next field is one; keywords are left in place.
    fn optional_number(&mut self, what: &str) -> SceneResult<Option<f32>> {
        let Some(&token) = self.tokens.peek() else {
            return Ok(None);
        };
        if !starts_numeric(token) {
            return Ok(None);
        }
        self.tokens.next();
        self.parse_number(token, what).map(Some)
    }

    fn unit_number(&mut self, what: &str) -> SceneResult<f32> {
        let value = self.number(what)?;
        if !(0.0..=1.0).contains(&value) {
            return Err(self.error(format!("{what} {value} must be between 0 and 1")));
        }
        Ok(value)
    }

    fn vec3(&mut self, what: &str) -> SceneResult<Vec3> {
        Ok(Vec3::new(self.number(what)?, self.number(what)?, self.number(what)?))
    }

    /// A non-zero vector, normalized.
    fn direction(&mut self, what: &str) -> SceneResult<Vec3> {
        self.vec3(what)?
            .try_normalize()
            .ok_or_else(|| self.error(format!("{what} must not be zero")))
    }

    fn material(&mut self) -> SceneResult<Material> {
        let albedo = match self.optional_number("albedo")? {
            Some(albedo) if !(0.0..=1.0).contains(&albedo) => {
                return Err(self.error(format!("albedo {albedo} must be between 0 and 1")))
            }
            Some(albedo) => albedo,
            None => return Ok(Material::default()),
        };
        Ok(Material::new(albedo))
    }

    fn orbit(&mut self) -> SceneResult<Orbit> {
        Ok(Orbit {
            pivot: self.vec3("orbit pivot")?,
            degrees_per_sec: self.number("orbit rate")?,
        })
    }

    fn finish(mut self) -> SceneResult<()> {
        match self.tokens.next() {
            Some(extra) => Err(self.error(format!("unexpected trailing field '{extra}'"))),
            None => Ok(()),
        }
    }
}

fn starts_numeric(token: &str) -> bool {
    token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::encode_stl;
    use crate::scene::Traversal;
    use cosmo_math::{Interval, Ray};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn no_meshes() -> HashMap<String, Arc<Mesh>> {
        HashMap::new()
    }

    fn cube_meshes() -> HashMap<String, Arc<Mesh>> {
        let a = Vec3::new(-1.0, -1.0, 0.0);
        let b = Vec3::new(1.0, -1.0, 0.0);
        let c = Vec3::new(1.0, 1.0, 0.0);
        let mesh = Mesh::from_stl("tri", &encode_stl(&[[a, b, c]])).unwrap();
        HashMap::from([("tri".to_string(), Arc::new(mesh))])
    }

    #[test]
    fn test_parse_full_scene() {
        init_logging();
        let scene = "\
# demo scene
camera 0 1 5, 0 0 -1, 45
light 2, 4, 2 0.8
light -2 4 2
ambient 0.1

// objects
sphere 0 0 0 1 0.5 orbit 0 0 -2 30
plane 0 -1 0  0 1 0
mesh tri 0 0 -3 2 0.25 spin 0 1 0 45
";
        let world = parse_scene(scene.lines(), &cube_meshes()).expect("scene should parse");

        assert_eq!(world.camera.position(), Vec3::new(0.0, 1.0, 5.0));
        assert_eq!(world.camera.fov(), 45.0);
        assert_eq!(world.lights.len(), 2);
        assert_eq!(world.lights[0].intensity, 0.8);
        assert_eq!(world.lights[1].intensity, 1.0);
        assert_eq!(world.ambient, 0.1);
        assert_eq!(world.objects.len(), 3);
        assert!(matches!(world.objects[0], Object::Sphere(_)));
        assert!(matches!(world.objects[1], Object::Plane(_)));
        assert!(matches!(world.objects[2], Object::Mesh(_)));
        assert!(world.objects[0].is_animated());
        assert!(!world.objects[1].is_animated());
        assert!(world.objects[2].is_animated());
        assert_eq!(world.triangle_count(), 1);
    }

    #[test]
    fn test_unknown_keyword_reports_line() {
        let err = parse_scene(["foo 1 2 3"], &no_meshes()).unwrap_err();
        match err {
            SceneError::Syntax { line, reason } => {
                assert_eq!(line, 1);
                assert!(reason.contains("foo"), "reason should name the keyword: {reason}");
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_line_numbers_count_comments_and_blanks() {
        let lines = ["# header", "", "sphere 0 0 0 1", "sphere 0 0 zero 1"];
        let err = parse_scene(lines, &no_meshes()).unwrap_err();
        assert!(matches!(err, SceneError::Syntax { line: 4, .. }), "got {err:?}");
    }

    #[test]
    fn test_unknown_mesh() {
        let err = parse_scene(["mesh teapot 0 0 0"], &no_meshes()).unwrap_err();
        assert_eq!(
            err,
            SceneError::UnknownMesh {
                line: 1,
                name: "teapot".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_camera() {
        let lines = ["camera 0 0 0 0 0 -1 60", "camera 0 0 1 0 0 -1 60"];
        let err = parse_scene(lines, &no_meshes()).unwrap_err();
        assert_eq!(err, SceneError::DuplicateCamera { line: 2 });
    }

    #[test]
    fn test_duplicate_ambient_is_syntax_error() {
        let err = parse_scene(["ambient 0.1", "ambient 0.2"], &no_meshes()).unwrap_err();
        assert!(matches!(err, SceneError::Syntax { line: 2, .. }));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let bad = [
            "sphere 0 0 0 -1",
            "sphere 0 0 0 1 1.5",
            "sphere 0 0 0",
            "sphere 0 0 0 1 spin 0 1 0 10",
            "plane 0 0 0 0 0 0",
            "camera 0 0 0 0 0 -1 180",
            "camera 0 0 0 0 0 0 60",
            "light 0 0 0 nan",
            "light 0 0 0 1 2",
            "ambient 2",
        ];
        for line in bad {
            let result = parse_scene([line], &no_meshes());
            assert!(
                matches!(result, Err(SceneError::Syntax { line: 1, .. })),
                "'{line}' should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn test_commas_need_a_field_on_each_side() {
        let world = parse_scene(["camera 0, 0, 5, 0,0,-1 , 60"], &no_meshes()).unwrap();
        assert_eq!(world.camera.position(), Vec3::new(0.0, 0.0, 5.0));

        for line in [
            "camera 0 0 5,,0 0 -1 60",
            "camera 0 0 5, ,0 0 -1 60",
            "sphere 0 0 0 1,",
            ",sphere 0 0 0 1",
        ] {
            let result = parse_scene(["", line], &no_meshes());
            assert!(
                matches!(result, Err(SceneError::Syntax { line: 2, .. })),
                "'{line}' should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn test_missing_camera_uses_default() {
        init_logging();
        let world = parse_scene(["sphere 0 0 -3 1"], &no_meshes()).unwrap();
        assert_eq!(world.camera.position(), Vec3::ZERO);
        assert_eq!(world.camera.direction(), Vec3::NEG_Z);
        assert_eq!(world.camera.fov(), 60.0);
    }

    #[test]
    fn test_empty_scene() {
        let world = parse_scene(Vec::<String>::new(), &no_meshes()).unwrap();
        assert!(world.objects.is_empty());
        assert!(world.lights.is_empty());
    }

    #[test]
    fn test_mesh_placement_is_applied() {
        init_logging();
        let world = parse_scene(["mesh tri 0 0 -4 2"], &cube_meshes()).unwrap();
        // Scaled by 2 the triangle reaches x = 1.5 at y = -1.5
        let ray = Ray::new(Vec3::new(1.5, -1.5, 0.0), -Vec3::Z);

        let hit = world
            .intersect(&ray, Interval::new(0.001, f32::INFINITY), Traversal::Accelerated)
            .expect("scaled mesh should be hit");
        assert!((hit.t - 4.0).abs() < 1e-4);
    }
}
