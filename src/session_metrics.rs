use crate::types::SmoothedLabel;

/// Acumuladores de tiempo de la sesión de detección en curso.
///
/// Cada frame aporta su tiempo transcurrido a exactamente uno de los dos
/// totales según la etiqueta dominante (`Buscando` no aporta a ninguno).
/// Los totales solo crecen; se reinician creando una sesión nueva.
#[derive(Debug, Clone, Default)]
pub struct SessionMetrics {
    tiempo_bueno: f64,
    tiempo_malo: f64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acumular(&mut self, dominante: SmoothedLabel, delta_segundos: f64) {
        if dominante.es_mala() {
            self.tiempo_malo += delta_segundos;
        } else if dominante.cuenta_como_buena() {
            self.tiempo_bueno += delta_segundos;
        }
    }

    /// Segundos acumulados con postura Perfecto o Aceptable
    pub fn tiempo_bueno(&self) -> f64 {
        self.tiempo_bueno
    }

    /// Segundos acumulados con postura Malo
    pub fn tiempo_malo(&self) -> f64 {
        self.tiempo_malo
    }
}

/// Convierte segundos al formato H:MM:SS para mostrar
pub fn format_time(segundos: f64) -> String {
    let total = segundos.max(0.0) as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    format!("{}:{:02}:{:02}", h, m, s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PostureLabel;

    #[test]
    fn test_malo_solo_suma_al_total_malo() {
        let mut metricas = SessionMetrics::new();
        metricas.acumular(SmoothedLabel::Etiqueta(PostureLabel::Malo), 0.5);

        assert_eq!(metricas.tiempo_malo(), 0.5);
        assert_eq!(metricas.tiempo_bueno(), 0.0);
    }

    #[test]
    fn test_perfecto_y_aceptable_suman_al_total_bueno() {
        let mut metricas = SessionMetrics::new();
        metricas.acumular(SmoothedLabel::Etiqueta(PostureLabel::Perfecto), 0.3);
        metricas.acumular(SmoothedLabel::Etiqueta(PostureLabel::Aceptable), 0.2);

        assert_eq!(metricas.tiempo_bueno(), 0.5);
        assert_eq!(metricas.tiempo_malo(), 0.0);
    }

    #[test]
    fn test_buscando_no_suma_a_ninguno() {
        let mut metricas = SessionMetrics::new();
        metricas.acumular(SmoothedLabel::Buscando, 1.5);

        assert_eq!(metricas.tiempo_bueno(), 0.0);
        assert_eq!(metricas.tiempo_malo(), 0.0);
    }

    #[test]
    fn test_los_totales_solo_crecen() {
        let mut metricas = SessionMetrics::new();
        for _ in 0..100 {
            metricas.acumular(SmoothedLabel::Etiqueta(PostureLabel::Malo), 0.03);
            metricas.acumular(SmoothedLabel::Etiqueta(PostureLabel::Perfecto), 0.03);
        }

        assert!((metricas.tiempo_malo() - 3.0).abs() < 1e-9);
        assert!((metricas.tiempo_bueno() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00:00");
        assert_eq!(format_time(59.9), "0:00:59");
        assert_eq!(format_time(61.0), "0:01:01");
        assert_eq!(format_time(3661.0), "1:01:01");
        assert_eq!(format_time(-5.0), "0:00:00");
    }
}
